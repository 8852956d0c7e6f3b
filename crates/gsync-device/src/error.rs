//! Transport and session error types.

use std::time::Duration;

use thiserror::Error;

use garmin_wire::{DeviceErrorCode, WireError};

/// Errors from the byte transport layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint could not be reached or is gone.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No bytes arrived within the deadline.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Errors surfaced by a device session.
///
/// Any error other than [`SessionError::NotConnected`] and the pre-transfer
/// validation failures latches the session into the Faulted state; the
/// caller must reconnect before issuing further commands.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport-level failure (other than a timeout).
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// No response arrived within the operation deadline.
    ///
    /// The device may or may not have acted on the request; the session is
    /// faulted rather than guessing.
    #[error("no response within the deadline")]
    Timeout,

    /// The identify exchange failed or the device speaks an unsupported
    /// protocol version. The transport has been closed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The session is faulted; all operations fail until reconnect.
    #[error("session is faulted; reconnect required")]
    SessionFaulted,

    /// No transport is attached (never connected, or disconnected).
    #[error("session is not connected")]
    NotConnected,

    /// The device answered with an error status. The raw code is preserved
    /// for diagnosis.
    #[error("device rejected the request: {0}")]
    DeviceRejected(DeviceErrorCode),

    /// A multi-segment transfer died before its finalize was acknowledged.
    ///
    /// The device state is unknown: it holds the acknowledged segments but
    /// the transfer was never committed. Distinct from both success and
    /// plain failure; the core never retries on its own.
    #[error("transfer incomplete after {segments_sent} acknowledged segments")]
    Incomplete {
        /// Segments acknowledged by the device before the failure.
        segments_sent: u16,
        /// The failure that interrupted the transfer.
        #[source]
        cause: Box<SessionError>,
    },

    /// Malformed or corrupt wire traffic.
    #[error("protocol violation: {0}")]
    Protocol(#[from] WireError),

    /// A response arrived for a different opcode than the in-flight request.
    #[error("response opcode 0x{actual:02X} does not match request 0x{expected:02X}")]
    UnexpectedOpcode {
        /// Opcode of the in-flight request.
        expected: u8,
        /// Opcode found in the response frame.
        actual: u8,
    },

    /// The device sent a frame while no request was in flight.
    #[error("unsolicited frame (opcode 0x{0:02X}) received while idle")]
    UnsolicitedFrame(u8),

    /// Response decoded to a variant that does not answer the request.
    #[error("response payload does not match request opcode")]
    MalformedResponse,

    /// Package payload cannot be expressed in the segment counter.
    #[error("package too large to transfer: maximum {max} bytes")]
    PackageTooLarge {
        /// Maximum transferable payload size.
        max: usize,
    },
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => SessionError::Timeout,
            other => SessionError::Transport(other),
        }
    }
}
