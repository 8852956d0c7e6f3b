//! Error types for garmin-package.

use thiserror::Error;

/// Errors that can occur when parsing or serializing package containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// Container does not start with a known magic tag.
    #[error("bad magic: {found:02X?}")]
    BadMagic {
        /// The four bytes found where a magic tag was expected.
        found: [u8; 4],
    },

    /// Container format version is not supported.
    #[error("unsupported container version: {found}")]
    UnsupportedVersion {
        /// Version tag found in the container.
        found: u16,
    },

    /// Container ends before its declared contents.
    #[error("truncated container: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// Trailing checksum does not match the container contents.
    #[error("container checksum mismatch: expected 0x{expected:08X}, computed 0x{actual:08X}")]
    ChecksumMismatch {
        /// Checksum stored in the container.
        expected: u32,
        /// Checksum computed over the container bytes.
        actual: u32,
    },

    /// A metadata field holds a value outside its documented range.
    #[error("invalid value at offset {offset}: {message}")]
    InvalidValue {
        /// Byte offset of the offending field.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// Bytes remain after the trailing checksum.
    #[error("{extra} trailing bytes after container end")]
    TrailingBytes {
        /// Number of unexpected extra bytes.
        extra: usize,
    },

    /// Invalid UTF-8 in a string field.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

impl PackageError {
    /// Create an invalid-value error at a specific offset.
    pub fn invalid_at(offset: usize, message: impl Into<String>) -> Self {
        PackageError::InvalidValue {
            offset,
            message: message.into(),
        }
    }
}
