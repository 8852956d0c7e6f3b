//! Session state machine scenarios against a scripted transport.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use garmin_package::{ApplicationMeta, ApplicationPackage, Package};
use garmin_wire::{
    encode_frame, AppType, DeviceActivity, DeviceErrorCode, DeviceIdentity, DeviceStatus,
    FrameCodec, InstalledApp, Response, StoreId, Version, OP_IDENTIFY, OP_LIST_INSTALLED,
    OP_QUERY_STATUS, OP_TRANSFER_BEGIN, OP_TRANSFER_FINALIZE, OP_TRANSFER_SEGMENT, SEGMENT_SIZE,
};
use gsync_device::{
    DeviceSession, PushProgress, SessionError, SessionState, Transport, TransportError,
};

#[derive(Default)]
struct MockState {
    reads: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    read_calls: usize,
    write_calls: usize,
    closed: bool,
}

/// A transport that replays a scripted byte stream, one chunk per read.
#[derive(Clone, Default)]
struct MockTransport(Rc<RefCell<MockState>>);

impl MockTransport {
    fn new(reads: Vec<Vec<u8>>) -> Self {
        MockTransport(Rc::new(RefCell::new(MockState {
            reads: reads.into(),
            ..MockState::default()
        })))
    }

    fn written_opcodes(&self) -> Vec<u8> {
        let mut codec = FrameCodec::new();
        codec.push(&self.0.borrow().written);
        let mut opcodes = Vec::new();
        while let Some((opcode, _)) = codec.decode().unwrap() {
            opcodes.push(opcode);
        }
        opcodes
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        let mut state = self.0.borrow_mut();
        state.read_calls += 1;
        match state.reads.pop_front() {
            Some(mut chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.reads.push_front(chunk.split_off(n));
                }
                Ok(n)
            }
            None => Err(TransportError::Timeout(timeout)),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.0.borrow_mut();
        state.write_calls += 1;
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.0.borrow_mut().closed = true;
        Ok(())
    }
}

fn response_frame(opcode: u8, response: &Response) -> Vec<u8> {
    encode_frame(opcode, &response.encode()).unwrap()
}

fn identity(protocol: Version) -> DeviceIdentity {
    DeviceIdentity {
        protocol,
        device_type_id: 3415,
        serial_number: 9_001_234,
        firmware: Version::new(12, 30),
        max_apps: 30,
        part_number: "006-B3415-00".to_string(),
        product_name: "fenix 7".to_string(),
    }
}

fn identity_frame(protocol: Version) -> Vec<u8> {
    response_frame(OP_IDENTIFY, &Response::Identity(identity(protocol)))
}

fn app_package(payload_len: usize) -> Package {
    Package::Application(ApplicationPackage {
        meta: ApplicationMeta {
            store_id: StoreId::new([0xAB; 16]),
            version: 41,
            app_type: AppType::WatchFace,
            has_settings: false,
            compatible_devices: vec![3415],
            name: "Infocal".to_string(),
        },
        payload: vec![0x5A; payload_len],
    })
}

fn connected_session(extra_reads: Vec<Vec<u8>>) -> (DeviceSession<MockTransport>, MockTransport) {
    let mut reads = vec![identity_frame(Version::new(2, 0))];
    reads.extend(extra_reads);
    let mock = MockTransport::new(reads);
    let mut session = DeviceSession::with_timeout(mock.clone(), Duration::from_millis(50));
    session.connect().unwrap();
    (session, mock)
}

#[test]
fn connect_learns_identity() {
    let (session, _mock) = connected_session(vec![]);
    assert_eq!(session.state(), SessionState::Idle);
    let identity = session.identity().unwrap();
    assert_eq!(identity.product_name, "fenix 7");
    assert_eq!(identity.device_type_id, 3415);
}

#[test]
fn unsupported_protocol_version_fails_handshake_and_closes_transport() {
    let mock = MockTransport::new(vec![identity_frame(Version::new(9, 9))]);
    let mut session = DeviceSession::with_timeout(mock.clone(), Duration::from_millis(50));

    let err = session.connect().unwrap_err();
    match err {
        SessionError::HandshakeFailed(reason) => assert!(reason.contains("9.9")),
        other => panic!("expected HandshakeFailed, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Faulted);
    assert!(mock.0.borrow().closed);
}

#[test]
fn handshake_timeout_closes_transport() {
    let mock = MockTransport::new(vec![]);
    let mut session = DeviceSession::with_timeout(mock.clone(), Duration::from_millis(10));

    let err = session.connect().unwrap_err();
    assert!(matches!(err, SessionError::HandshakeFailed(_)));
    assert!(mock.0.borrow().closed);
}

#[test]
fn list_installed_returns_inventory() {
    let apps = vec![InstalledApp {
        store_id: StoreId::new([0x01; 16]),
        version: 7,
        app_type: AppType::DataField,
        name: "Stryd Zones".to_string(),
    }];
    let (mut session, _mock) = connected_session(vec![response_frame(
        OP_LIST_INSTALLED,
        &Response::Installed(apps.clone()),
    )]);

    assert_eq!(session.list_installed().unwrap(), apps);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn query_status_roundtrip() {
    let status = DeviceStatus {
        activity: DeviceActivity::Idle,
        apps_installed: 4,
        storage_free: 1 << 20,
    };
    let (mut session, _mock) =
        connected_session(vec![response_frame(OP_QUERY_STATUS, &Response::Status(status))]);
    assert_eq!(session.query_status().unwrap(), status);
}

#[test]
fn push_sends_segments_and_finalize() {
    let package = app_package(2100); // 3 segments: 1024 + 1024 + 52
    let mut reads = vec![response_frame(OP_TRANSFER_BEGIN, &Response::BeginAck)];
    for index in 0..3 {
        reads.push(response_frame(
            OP_TRANSFER_SEGMENT,
            &Response::SegmentAck { index },
        ));
    }
    reads.push(response_frame(OP_TRANSFER_FINALIZE, &Response::FinalizeAck));
    let (mut session, mock) = connected_session(reads);

    let mut seen: Vec<PushProgress> = Vec::new();
    session.push(&package, |progress| seen.push(progress)).unwrap();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].bytes_sent, SEGMENT_SIZE);
    assert_eq!(seen[1].bytes_sent, 2 * SEGMENT_SIZE);
    assert_eq!(seen[2].bytes_sent, 2100);
    assert!(seen.iter().all(|p| p.segments_total == 3));

    assert_eq!(
        mock.written_opcodes(),
        vec![
            OP_IDENTIFY,
            OP_TRANSFER_BEGIN,
            OP_TRANSFER_SEGMENT,
            OP_TRANSFER_SEGMENT,
            OP_TRANSFER_SEGMENT,
            OP_TRANSFER_FINALIZE,
        ]
    );
}

#[test]
fn segment_timeout_reports_incomplete_without_finalize() {
    // 10-segment package; the device stops answering at segment 7.
    let package = app_package(10 * SEGMENT_SIZE);
    let mut reads = vec![response_frame(OP_TRANSFER_BEGIN, &Response::BeginAck)];
    for index in 0..6 {
        reads.push(response_frame(
            OP_TRANSFER_SEGMENT,
            &Response::SegmentAck { index },
        ));
    }
    let (mut session, mock) = connected_session(reads);

    let err = session.push(&package, |_| {}).unwrap_err();
    match err {
        SessionError::Incomplete {
            segments_sent,
            cause,
        } => {
            assert_eq!(segments_sent, 6);
            assert!(matches!(*cause, SessionError::Timeout));
        }
        other => panic!("expected Incomplete, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Faulted);
    // Finalize must never have been attempted.
    assert!(!mock.written_opcodes().contains(&OP_TRANSFER_FINALIZE));
}

#[test]
fn begin_rejection_surfaces_device_code() {
    let (mut session, mock) = connected_session(vec![response_frame(
        OP_TRANSFER_BEGIN,
        &Response::Rejected(DeviceErrorCode::SlotFull),
    )]);

    let err = session.push(&app_package(100), |_| {}).unwrap_err();
    assert!(matches!(
        err,
        SessionError::DeviceRejected(DeviceErrorCode::SlotFull)
    ));
    assert_eq!(session.state(), SessionState::Faulted);
    // No payload bytes left the host.
    assert!(!mock.written_opcodes().contains(&OP_TRANSFER_SEGMENT));
}

#[test]
fn push_while_faulted_does_not_touch_transport() {
    // Fault the session with a status query that never gets an answer.
    let (mut session, mock) = connected_session(vec![]);
    assert!(matches!(
        session.query_status().unwrap_err(),
        SessionError::Timeout
    ));
    assert_eq!(session.state(), SessionState::Faulted);

    let (reads_before, writes_before) = {
        let state = mock.0.borrow();
        (state.read_calls, state.write_calls)
    };
    let err = session.push(&app_package(100), |_| {}).unwrap_err();
    assert!(matches!(err, SessionError::SessionFaulted));
    let state = mock.0.borrow();
    assert_eq!(state.read_calls, reads_before);
    assert_eq!(state.write_calls, writes_before);
}

#[test]
fn mismatched_opcode_faults_session() {
    // Device answers a status query with a list response.
    let (mut session, _mock) = connected_session(vec![response_frame(
        OP_LIST_INSTALLED,
        &Response::Installed(vec![]),
    )]);

    let err = session.query_status().unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnexpectedOpcode {
            expected: OP_QUERY_STATUS,
            actual: OP_LIST_INSTALLED,
        }
    ));
    assert_eq!(session.state(), SessionState::Faulted);
}

#[test]
fn unsolicited_frame_while_idle_faults_next_exchange() {
    // The device sends the status answer and a spurious extra frame in one
    // burst; the extra frame must fault the following exchange.
    let status = DeviceStatus {
        activity: DeviceActivity::Idle,
        apps_installed: 0,
        storage_free: 0,
    };
    let mut burst = response_frame(OP_QUERY_STATUS, &Response::Status(status));
    burst.extend_from_slice(&response_frame(OP_QUERY_STATUS, &Response::Status(status)));
    let (mut session, _mock) = connected_session(vec![burst]);

    session.query_status().unwrap();
    let err = session.query_status().unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnsolicitedFrame(OP_QUERY_STATUS)
    ));
    assert_eq!(session.state(), SessionState::Faulted);
}

#[test]
fn disconnect_closes_transport_and_is_reusable_as_noop() {
    let (mut session, mock) = connected_session(vec![]);
    session.disconnect();
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(mock.0.borrow().closed);
    session.disconnect();

    // Operations after disconnect report NotConnected, not a fault.
    assert!(matches!(
        session.list_installed().unwrap_err(),
        SessionError::NotConnected
    ));
}

#[test]
fn corrupt_response_frame_faults_session() {
    let status = DeviceStatus {
        activity: DeviceActivity::Idle,
        apps_installed: 0,
        storage_free: 0,
    };
    let mut frame = response_frame(OP_QUERY_STATUS, &Response::Status(status));
    let last = frame.len() - 1;
    frame[last] ^= 0x01;
    let (mut session, _mock) = connected_session(vec![frame]);

    let err = session.query_status().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(garmin_wire::WireError::ChecksumMismatch { .. })
    ));
    assert_eq!(session.state(), SessionState::Faulted);
}
