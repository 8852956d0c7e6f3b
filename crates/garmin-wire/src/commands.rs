//! Commands sent from the host to the device.

use crate::constants::*;
use crate::error::WireError;
use crate::frame::encode_frame;
use crate::types::{PackageKind, Version};

/// Commands the host can send to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request device identity. First command of every session.
    Identify {
        /// Highest protocol version the host speaks.
        protocol: Version,
    },

    /// List the Connect IQ apps installed on the device.
    ListInstalled,

    /// Query device status.
    QueryStatus,

    /// Announce an incoming transfer.
    TransferBegin {
        /// Kind of payload being transferred.
        kind: PackageKind,
        /// Display name for the transfer (truncated to [`MAX_NAME_LEN`] bytes).
        name: String,
        /// Total payload size in bytes.
        total_size: u32,
        /// Number of segments that will follow.
        segment_count: u16,
    },

    /// One segment of an in-progress transfer.
    TransferSegment {
        /// Zero-based segment index.
        index: u16,
        /// Segment bytes (at most [`SEGMENT_SIZE`]).
        data: Vec<u8>,
    },

    /// Commit a completed transfer.
    TransferFinalize {
        /// CRC-32 over the full reassembled payload.
        payload_crc: u32,
    },
}

impl Command {
    /// Get the opcode for this command.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Identify { .. } => OP_IDENTIFY,
            Command::ListInstalled => OP_LIST_INSTALLED,
            Command::QueryStatus => OP_QUERY_STATUS,
            Command::TransferBegin { .. } => OP_TRANSFER_BEGIN,
            Command::TransferSegment { .. } => OP_TRANSFER_SEGMENT,
            Command::TransferFinalize { .. } => OP_TRANSFER_FINALIZE,
        }
    }

    /// Encode the command payload (frame header excluded).
    ///
    /// Names longer than [`MAX_NAME_LEN`] bytes are truncated; the device
    /// only displays them.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Command::Identify { protocol } => {
                buf.push(protocol.major);
                buf.push(protocol.minor);
            }

            Command::ListInstalled => {}

            Command::QueryStatus => {}

            Command::TransferBegin {
                kind,
                name,
                total_size,
                segment_count,
            } => {
                buf.push(u8::from(*kind));
                buf.extend_from_slice(&total_size.to_le_bytes());
                buf.extend_from_slice(&segment_count.to_le_bytes());
                let name_bytes = name.as_bytes();
                let len = name_bytes.len().min(MAX_NAME_LEN);
                buf.push(len as u8);
                buf.extend_from_slice(&name_bytes[..len]);
            }

            Command::TransferSegment { index, data } => {
                buf.extend_from_slice(&index.to_le_bytes());
                buf.extend_from_slice(data);
            }

            Command::TransferFinalize { payload_crc } => {
                buf.extend_from_slice(&payload_crc.to_le_bytes());
            }
        }

        buf
    }

    /// Encode the command as a complete wire frame.
    pub fn to_frame(&self) -> Result<Vec<u8>, WireError> {
        encode_frame(self.opcode(), &self.encode())
    }
}
