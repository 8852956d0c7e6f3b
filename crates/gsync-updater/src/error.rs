//! Update orchestration error types.

use thiserror::Error;

use garmin_package::PackageError;
use gsync_device::SessionError;

use crate::catalog::CatalogError;

/// Errors that can fail a single update or the whole batch.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The catalog collaborator could not produce the package bytes.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The fetched bytes are not a valid package container.
    #[error("package error: {0}")]
    Package(#[from] PackageError),

    /// The package does not target the connected device.
    #[error("incompatible package: {0}")]
    Incompatible(String),

    /// The fetched byte count disagrees with the descriptor.
    #[error("size mismatch: descriptor says {expected} bytes, fetched {actual}")]
    SizeMismatch {
        /// Size declared by the descriptor.
        expected: u64,
        /// Size of the fetched bytes.
        actual: u64,
    },

    /// The device session failed; the batch halts on these.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The session has no device identity; run the handshake first.
    #[error("session is not connected; connect before running a batch")]
    NotConnected,
}

impl UpdateError {
    /// Whether this failure halts the remainder of the batch.
    ///
    /// Device-level failures leave the session faulted (or the device state
    /// unknown), so nothing further is attempted. Failures that never
    /// touched the device only fail their own update.
    pub fn halts_batch(&self) -> bool {
        matches!(self, UpdateError::Session(_) | UpdateError::NotConnected)
    }
}
