//! Garmin USB Serial Wire Protocol
//!
//! This crate provides types and utilities for the framed serial protocol
//! Garmin wearables speak over a direct USB connection. The protocol is
//! undocumented; everything here (opcodes, framing, checksum, payload
//! layouts) was recovered from captured traffic between the official
//! desktop client and real hardware, and is pinned by test vectors.
//!
//! # Protocol Overview
//!
//! Every message is a single frame: a 7-byte header (opcode, payload
//! length, CRC-32) followed by the payload. Exchanges are strictly
//! synchronous request/response:
//!
//! - **Commands** (host → device): identified by an `OP_*` opcode
//! - **Responses** (device → host): echo the request opcode; the first
//!   payload byte is a `STATUS_*` code
//!
//! There are no correlation ids and no unsolicited device messages, which
//! is why sessions built on this crate must keep at most one request in
//! flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use garmin_wire::{Command, FrameCodec, Response, Version};
//!
//! // Build a command frame
//! let cmd = Command::Identify { protocol: Version::new(2, 0) };
//! let frame = cmd.to_frame()?;
//!
//! // Feed received bytes and decode the response
//! let mut codec = FrameCodec::new();
//! codec.push(&received);
//! if let Some((opcode, payload)) = codec.decode()? {
//!     let response = Response::decode(opcode, &payload)?;
//! }
//! ```

mod checksum;
mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod types;

pub use checksum::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
