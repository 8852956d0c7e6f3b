//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding wire traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Frame payload exceeds the protocol maximum.
    #[error("frame payload too large: maximum {max} bytes, got {actual}")]
    FrameTooLarge {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Frame checksum does not match its contents.
    #[error("frame checksum mismatch: expected 0x{expected:08X}, computed 0x{actual:08X}")]
    ChecksumMismatch {
        /// Checksum carried in the frame header.
        expected: u32,
        /// Checksum computed over the received bytes.
        actual: u32,
    },

    /// Byte stream ended in the middle of a frame.
    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// Unknown opcode in a received frame.
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Response payload is too short for its opcode.
    #[error("response too short: expected at least {expected} bytes, got {actual}")]
    ResponseTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

/// Error codes reported by the device in a rejection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorCode {
    /// No free application slot.
    SlotFull,
    /// Package not built for this device type.
    IncompatibleDevice,
    /// Segment out of sequence or no transfer in progress.
    BadSequence,
    /// Device-side storage write failed.
    StorageFailure,
    /// Device busy with another operation.
    Busy,
    /// Unknown error code, preserved raw for diagnosis.
    Unknown(u8),
}

impl std::fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceErrorCode::SlotFull => write!(f, "application slots full"),
            DeviceErrorCode::IncompatibleDevice => write!(f, "incompatible device"),
            DeviceErrorCode::BadSequence => write!(f, "bad transfer sequence"),
            DeviceErrorCode::StorageFailure => write!(f, "storage failure"),
            DeviceErrorCode::Busy => write!(f, "device busy"),
            DeviceErrorCode::Unknown(code) => write!(f, "unknown error (0x{:02X})", code),
        }
    }
}

impl From<u8> for DeviceErrorCode {
    fn from(code: u8) -> Self {
        use crate::constants::*;
        match code {
            STATUS_SLOT_FULL => DeviceErrorCode::SlotFull,
            STATUS_INCOMPATIBLE => DeviceErrorCode::IncompatibleDevice,
            STATUS_BAD_SEQUENCE => DeviceErrorCode::BadSequence,
            STATUS_STORAGE_FAILURE => DeviceErrorCode::StorageFailure,
            STATUS_BUSY => DeviceErrorCode::Busy,
            _ => DeviceErrorCode::Unknown(code),
        }
    }
}

impl From<DeviceErrorCode> for u8 {
    fn from(code: DeviceErrorCode) -> Self {
        use crate::constants::*;
        match code {
            DeviceErrorCode::SlotFull => STATUS_SLOT_FULL,
            DeviceErrorCode::IncompatibleDevice => STATUS_INCOMPATIBLE,
            DeviceErrorCode::BadSequence => STATUS_BAD_SEQUENCE,
            DeviceErrorCode::StorageFailure => STATUS_STORAGE_FAILURE,
            DeviceErrorCode::Busy => STATUS_BUSY,
            DeviceErrorCode::Unknown(code) => code,
        }
    }
}
