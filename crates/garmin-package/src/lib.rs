//! Garmin Package Container Formats
//!
//! Garmin distributes device payloads in three binary container formats:
//! Connect IQ application binaries (`.PRG`), application settings blobs
//! (`.SET`), and firmware/update payloads. All three share the same outer
//! structure, recovered by reverse engineering:
//!
//! | Field     | Size (bytes) | Description                                  |
//! |-----------|--------------|----------------------------------------------|
//! | magic     | 4            | Format tag: `GAPP`, `GSET`, or `GFWU`.       |
//! | version   | 2            | Container format version (currently 1).      |
//! | metadata  | variable     | Format-specific metadata block.              |
//! | payload   | 4 + N        | Length-prefixed opaque device payload.       |
//! | checksum  | 4            | CRC-32 over everything before this field.    |
//!
//! A container parses into an immutable [`Package`]; its checksum is
//! validated during parsing, before any transmission can be attempted.
//! [`encode_package`] is the total inverse of [`decode_package`].

mod codec;
mod error;
mod types;

pub use codec::*;
pub use error::*;
pub use types::*;
