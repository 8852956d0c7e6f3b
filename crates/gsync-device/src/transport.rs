//! Byte transport abstraction.
//!
//! A [`Transport`] owns one physical or virtual serial connection and moves
//! raw bytes with blocking, caller-supplied timeouts. It knows nothing about
//! framing; that lives in `garmin-wire`.

use std::time::Duration;

use crate::error::TransportError;

/// A blocking byte stream to one device.
///
/// Implementations never retry on their own and never buffer across calls;
/// cancellation is expressed purely as the read timeout.
pub trait Transport {
    /// Read up to `buf.len()` bytes, waiting at most `timeout`.
    ///
    /// Returns the number of bytes read (at least 1), or
    /// [`TransportError::Timeout`] if nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;

    /// Write all bytes.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    fn close(&mut self) -> Result<(), TransportError>;
}
