//! Device session: the protocol state machine.
//!
//! A session owns one transport exclusively and drives the strictly
//! synchronous request/response conversation with the device. The wire
//! protocol has no request-correlation ids, so the session never allows
//! more than one request in flight; a response that cannot be matched to
//! the in-flight request faults the session.
//!
//! Once faulted, every operation fails with
//! [`SessionError::SessionFaulted`] without touching the transport; the
//! caller must open a fresh transport and build a new session. Guessing at
//! the device's state after a fault risks corrupting an in-progress
//! device-side write.

use std::time::{Duration, Instant};

use garmin_package::Package;
use garmin_wire::{
    crc32, Command, DeviceIdentity, DeviceStatus, FrameCodec, InstalledApp, Response, Version,
    PROTOCOL_MAJOR, PROTOCOL_MINOR, SEGMENT_SIZE,
};

use crate::error::{SessionError, TransportError};
use crate::transport::Transport;

/// Default per-exchange deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No handshake has run yet (or the session was disconnected).
    Disconnected,
    /// Identify sent, waiting for the device's identity.
    Handshaking,
    /// Connected, no request in flight.
    Idle,
    /// Exactly one request (with this opcode) is awaiting its response.
    AwaitingResponse(u8),
    /// An unrecoverable protocol fault occurred; reconnect required.
    Faulted,
}

/// Progress of an in-flight package push, reported after each acknowledged
/// segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushProgress {
    /// Segments acknowledged so far.
    pub segments_sent: u16,
    /// Total segments in this transfer.
    pub segments_total: u16,
    /// Payload bytes acknowledged so far.
    pub bytes_sent: usize,
    /// Total payload bytes.
    pub bytes_total: usize,
}

/// An exclusive session on one device handle.
pub struct DeviceSession<T: Transport> {
    transport: Option<T>,
    codec: FrameCodec,
    state: SessionState,
    identity: Option<DeviceIdentity>,
    timeout: Duration,
}

impl<T: Transport> DeviceSession<T> {
    /// Create a session over `transport` with the default exchange timeout.
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    /// Create a session with a custom per-exchange timeout.
    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        DeviceSession {
            transport: Some(transport),
            codec: FrameCodec::new(),
            state: SessionState::Disconnected,
            identity: None,
            timeout,
        }
    }

    /// Current state of the session.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identity learned during the handshake, if connected.
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    /// Run the handshake: send Identify, validate the device's identity.
    ///
    /// Fails with [`SessionError::HandshakeFailed`] if the response is
    /// malformed or the device speaks an unsupported protocol version; in
    /// that case the transport is closed before the error surfaces.
    pub fn connect(&mut self) -> Result<DeviceIdentity, SessionError> {
        match self.state {
            SessionState::Disconnected => {}
            SessionState::Faulted => return Err(SessionError::SessionFaulted),
            _ => {
                if let Some(identity) = self.identity.clone() {
                    return Ok(identity);
                }
                return Err(SessionError::SessionFaulted);
            }
        }
        if self.transport.is_none() {
            return Err(SessionError::NotConnected);
        }

        self.state = SessionState::Handshaking;
        log::debug!("starting handshake (host protocol {PROTOCOL_MAJOR}.{PROTOCOL_MINOR})");

        let identify = Command::Identify {
            protocol: Version::new(PROTOCOL_MAJOR, PROTOCOL_MINOR),
        };
        let response = match self.exchange(&identify) {
            Ok(response) => response,
            Err(err) => return Err(self.fail_handshake(format!("identify exchange failed: {err}"))),
        };

        let identity = match response {
            Response::Identity(identity) => identity,
            _ => return Err(self.fail_handshake("unexpected response to identify".to_string())),
        };
        if identity.protocol.major != PROTOCOL_MAJOR {
            return Err(self.fail_handshake(format!(
                "unsupported protocol version {}",
                identity.protocol
            )));
        }

        log::debug!(
            "connected to {} ({}, firmware {}, serial {})",
            identity.product_name,
            identity.part_number,
            identity.firmware,
            identity.serial_number
        );
        self.identity = Some(identity.clone());
        self.state = SessionState::Idle;
        Ok(identity)
    }

    /// Re-query the device identity.
    pub fn identify(&mut self) -> Result<DeviceIdentity, SessionError> {
        self.ensure_idle()?;
        let identify = Command::Identify {
            protocol: Version::new(PROTOCOL_MAJOR, PROTOCOL_MINOR),
        };
        match self.exchange(&identify)? {
            Response::Identity(identity) => {
                self.identity = Some(identity.clone());
                Ok(identity)
            }
            _ => Err(self.fault(SessionError::MalformedResponse)),
        }
    }

    /// List the Connect IQ apps installed on the device.
    pub fn list_installed(&mut self) -> Result<Vec<InstalledApp>, SessionError> {
        self.ensure_idle()?;
        match self.exchange(&Command::ListInstalled)? {
            Response::Installed(apps) => Ok(apps),
            _ => Err(self.fault(SessionError::MalformedResponse)),
        }
    }

    /// Query device status.
    pub fn query_status(&mut self) -> Result<DeviceStatus, SessionError> {
        self.ensure_idle()?;
        match self.exchange(&Command::QueryStatus)? {
            Response::Status(status) => Ok(status),
            _ => Err(self.fault(SessionError::MalformedResponse)),
        }
    }

    /// Push a package to the device.
    ///
    /// The payload travels in [`SEGMENT_SIZE`] chunks, one request/response
    /// exchange per segment, followed by a finalize exchange that commits
    /// the transfer. A failure after the first segment was sent surfaces as
    /// [`SessionError::Incomplete`]: the device holds an uncommitted partial
    /// transfer and its true state is unknown, so nothing is retried here.
    ///
    /// `progress` is invoked after each acknowledged segment.
    pub fn push<F>(&mut self, package: &Package, mut progress: F) -> Result<(), SessionError>
    where
        F: FnMut(PushProgress),
    {
        self.ensure_idle()?;

        let payload = package.payload();
        let segment_count = payload.len().div_ceil(SEGMENT_SIZE);
        if segment_count > u16::MAX as usize {
            return Err(SessionError::PackageTooLarge {
                max: SEGMENT_SIZE * u16::MAX as usize,
            });
        }
        let segments_total = segment_count as u16;

        log::debug!(
            "pushing {:?} '{}': {} bytes in {} segments",
            package.kind(),
            package.name(),
            payload.len(),
            segment_count
        );

        let begin = Command::TransferBegin {
            kind: package.kind(),
            name: package.name().to_string(),
            total_size: payload.len() as u32,
            segment_count: segments_total,
        };
        // A rejection here (slot full, incompatible, busy) bubbles out as
        // DeviceRejected: no payload bytes have been sent yet.
        match self.exchange(&begin)? {
            Response::BeginAck => {}
            _ => return Err(self.fault(SessionError::MalformedResponse)),
        }

        for (index, chunk) in payload.chunks(SEGMENT_SIZE).enumerate() {
            let sent_before = index as u16;
            let segment = Command::TransferSegment {
                index: sent_before,
                data: chunk.to_vec(),
            };
            let ack = self.exchange(&segment).map_err(|cause| {
                log::warn!("segment {index} failed after {sent_before} acknowledged: {cause}");
                SessionError::Incomplete {
                    segments_sent: sent_before,
                    cause: Box::new(cause),
                }
            })?;
            match ack {
                Response::SegmentAck { index: acked } if acked == sent_before => {}
                _ => {
                    let cause = self.fault(SessionError::MalformedResponse);
                    return Err(SessionError::Incomplete {
                        segments_sent: sent_before,
                        cause: Box::new(cause),
                    });
                }
            }
            progress(PushProgress {
                segments_sent: sent_before + 1,
                segments_total,
                bytes_sent: (index * SEGMENT_SIZE + chunk.len()).min(payload.len()),
                bytes_total: payload.len(),
            });
        }

        let finalize = Command::TransferFinalize {
            payload_crc: crc32(payload),
        };
        match self.exchange(&finalize) {
            Ok(Response::FinalizeAck) => {
                log::debug!("transfer of '{}' committed", package.name());
                Ok(())
            }
            Ok(_) => {
                let cause = self.fault(SessionError::MalformedResponse);
                Err(SessionError::Incomplete {
                    segments_sent: segments_total,
                    cause: Box::new(cause),
                })
            }
            // The device answered the finalize: its verdict is
            // authoritative, not ambiguous.
            Err(SessionError::DeviceRejected(code)) => Err(SessionError::DeviceRejected(code)),
            Err(cause) => {
                log::warn!("finalize unacknowledged; device state unknown: {cause}");
                Err(SessionError::Incomplete {
                    segments_sent: segments_total,
                    cause: Box::new(cause),
                })
            }
        }
    }

    /// Close the transport and return to Disconnected.
    pub fn disconnect(&mut self) {
        self.close_transport();
        self.codec.clear();
        self.identity = None;
        self.state = SessionState::Disconnected;
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Disconnected => Err(SessionError::NotConnected),
            _ => Err(SessionError::SessionFaulted),
        }
    }

    /// One strict request/response exchange. Any failure latches Faulted.
    fn exchange(&mut self, command: &Command) -> Result<Response, SessionError> {
        // With no correlation ids, a frame that arrived while nothing was
        // in flight means host and device have lost sync.
        match self.codec.decode() {
            Ok(None) => {}
            Ok(Some((opcode, _))) => {
                return Err(self.fault(SessionError::UnsolicitedFrame(opcode)));
            }
            Err(err) => return Err(self.fault(err.into())),
        }

        let opcode = command.opcode();
        let frame = command.to_frame()?;
        let timeout = self.timeout;
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return Err(SessionError::NotConnected),
        };

        if let Err(err) = transport.write_all(&frame) {
            return Err(self.fault(err.into()));
        }
        self.state = SessionState::AwaitingResponse(opcode);

        match read_response(transport, &mut self.codec, opcode, timeout) {
            Ok(Response::Rejected(code)) => Err(self.fault(SessionError::DeviceRejected(code))),
            Ok(response) => {
                self.state = SessionState::Idle;
                Ok(response)
            }
            Err(err) => Err(self.fault(err)),
        }
    }

    /// Latch the Faulted state and pass the error through.
    fn fault(&mut self, err: SessionError) -> SessionError {
        log::warn!("session faulted: {err}");
        self.state = SessionState::Faulted;
        err
    }

    fn fail_handshake(&mut self, reason: String) -> SessionError {
        self.close_transport();
        self.state = SessionState::Faulted;
        SessionError::HandshakeFailed(reason)
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close() {
                log::warn!("error closing transport: {err}");
            }
        }
    }
}

/// Read frames until the one answering `expected_opcode` arrives or the
/// deadline passes.
fn read_response<T: Transport>(
    transport: &mut T,
    codec: &mut FrameCodec,
    expected_opcode: u8,
    timeout: Duration,
) -> Result<Response, SessionError> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 256];
    loop {
        if let Some((opcode, payload)) = codec.decode()? {
            if opcode != expected_opcode {
                return Err(SessionError::UnexpectedOpcode {
                    expected: expected_opcode,
                    actual: opcode,
                });
            }
            return Ok(Response::decode(opcode, &payload)?);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(SessionError::Timeout);
        }
        match transport.read(&mut buf, deadline - now) {
            Ok(0) => {
                return Err(SessionError::Transport(TransportError::Connection(
                    "transport closed".to_string(),
                )))
            }
            Ok(n) => codec.push(&buf[..n]),
            Err(err) => return Err(err.into()),
        }
    }
}
