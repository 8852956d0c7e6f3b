//! Responses received from the device.
//!
//! The protocol has no request-correlation ids: a response frame echoes the
//! opcode of the command it answers, and its payload always starts with a
//! status byte. A non-zero status turns the whole payload into a rejection;
//! the opcode-specific body follows only on success.

use crate::constants::*;
use crate::error::{DeviceErrorCode, WireError};
use crate::types::{
    AppType, DeviceActivity, DeviceIdentity, DeviceStatus, InstalledApp, StoreId, Version,
};

/// Responses the device can send back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Device identity (reply to Identify).
    Identity(DeviceIdentity),

    /// Installed app inventory (reply to ListInstalled).
    Installed(Vec<InstalledApp>),

    /// Device status (reply to QueryStatus).
    Status(DeviceStatus),

    /// Transfer slot reserved (reply to TransferBegin).
    BeginAck,

    /// Segment received and written (reply to TransferSegment).
    SegmentAck {
        /// Echo of the acknowledged segment index.
        index: u16,
    },

    /// Transfer committed to durable storage (reply to TransferFinalize).
    FinalizeAck,

    /// Device rejected the command; any opcode.
    Rejected(DeviceErrorCode),
}

impl Response {
    /// Decode a response payload for the given request opcode.
    pub fn decode(opcode: u8, payload: &[u8]) -> Result<Self, WireError> {
        if payload.is_empty() {
            return Err(WireError::ResponseTooShort {
                expected: 1,
                actual: 0,
            });
        }

        let status = payload[0];
        if status != STATUS_OK {
            return Ok(Response::Rejected(DeviceErrorCode::from(status)));
        }

        let body = &payload[1..];
        match opcode {
            OP_IDENTIFY => {
                let mut offset = 0;
                let protocol = Version::new(read_u8(body, &mut offset)?, read_u8(body, &mut offset)?);
                let device_type_id = read_u16(body, &mut offset)?;
                let serial_number = read_u32(body, &mut offset)?;
                let firmware = Version::new(read_u8(body, &mut offset)?, read_u8(body, &mut offset)?);
                let max_apps = read_u8(body, &mut offset)?;
                let part_number = read_string(body, &mut offset)?;
                let product_name = read_string(body, &mut offset)?;
                Ok(Response::Identity(DeviceIdentity {
                    protocol,
                    device_type_id,
                    serial_number,
                    firmware,
                    max_apps,
                    part_number,
                    product_name,
                }))
            }

            OP_LIST_INSTALLED => {
                let mut offset = 0;
                let count = read_u16(body, &mut offset)?;
                let mut apps = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let raw_id = read_bytes(body, &mut offset, STORE_ID_SIZE)?;
                    // read_bytes already guarantees the length
                    let store_id = StoreId::from_slice(raw_id).unwrap_or_default();
                    let version = read_u32(body, &mut offset)?;
                    let app_type = AppType::from(read_u8(body, &mut offset)?);
                    let name = read_string(body, &mut offset)?;
                    apps.push(InstalledApp {
                        store_id,
                        version,
                        app_type,
                        name,
                    });
                }
                Ok(Response::Installed(apps))
            }

            OP_QUERY_STATUS => {
                let mut offset = 0;
                let activity = DeviceActivity::from(read_u8(body, &mut offset)?);
                let apps_installed = read_u8(body, &mut offset)?;
                let storage_free = read_u32(body, &mut offset)?;
                Ok(Response::Status(DeviceStatus {
                    activity,
                    apps_installed,
                    storage_free,
                }))
            }

            OP_TRANSFER_BEGIN => Ok(Response::BeginAck),

            OP_TRANSFER_SEGMENT => {
                let mut offset = 0;
                let index = read_u16(body, &mut offset)?;
                Ok(Response::SegmentAck { index })
            }

            OP_TRANSFER_FINALIZE => Ok(Response::FinalizeAck),

            other => Err(WireError::UnknownOpcode(other)),
        }
    }

    /// Encode the response payload (status byte included, frame header
    /// excluded). Inverse of [`decode`](Response::decode); device simulators
    /// and test fixtures build their traffic with this.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![STATUS_OK];

        match self {
            Response::Identity(identity) => {
                buf.push(identity.protocol.major);
                buf.push(identity.protocol.minor);
                buf.extend_from_slice(&identity.device_type_id.to_le_bytes());
                buf.extend_from_slice(&identity.serial_number.to_le_bytes());
                buf.push(identity.firmware.major);
                buf.push(identity.firmware.minor);
                buf.push(identity.max_apps);
                push_string(&mut buf, &identity.part_number);
                push_string(&mut buf, &identity.product_name);
            }

            Response::Installed(apps) => {
                buf.extend_from_slice(&(apps.len() as u16).to_le_bytes());
                for app in apps {
                    buf.extend_from_slice(app.store_id.as_bytes());
                    buf.extend_from_slice(&app.version.to_le_bytes());
                    buf.push(u8::from(app.app_type));
                    push_string(&mut buf, &app.name);
                }
            }

            Response::Status(status) => {
                buf.push(u8::from(status.activity));
                buf.push(status.apps_installed);
                buf.extend_from_slice(&status.storage_free.to_le_bytes());
            }

            Response::BeginAck => {}

            Response::SegmentAck { index } => {
                buf.extend_from_slice(&index.to_le_bytes());
            }

            Response::FinalizeAck => {}

            Response::Rejected(code) => {
                buf[0] = u8::from(*code);
            }
        }

        buf
    }
}

fn read_u8(data: &[u8], offset: &mut usize) -> Result<u8, WireError> {
    let bytes = read_bytes(data, offset, 1)?;
    Ok(bytes[0])
}

fn read_u16(data: &[u8], offset: &mut usize) -> Result<u16, WireError> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: &mut usize) -> Result<u32, WireError> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], WireError> {
    if *offset + len > data.len() {
        return Err(WireError::ResponseTooShort {
            expected: *offset + len,
            actual: data.len(),
        });
    }
    let slice = &data[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}

fn read_string(data: &[u8], offset: &mut usize) -> Result<String, WireError> {
    let len = read_u8(data, offset)? as usize;
    let bytes = read_bytes(data, offset, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
}

fn push_string(buf: &mut Vec<u8>, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(MAX_NAME_LEN);
    buf.push(len as u8);
    buf.extend_from_slice(&bytes[..len]);
}
