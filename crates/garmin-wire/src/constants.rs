//! Wire protocol constants
//!
//! Command opcodes, device status codes, and framing parameters for the
//! serial protocol spoken by Garmin wearables over USB. These values were
//! recovered from captured traffic between the official desktop client and
//! real hardware; treat them as compatibility contracts, not tunables.

// ============================================================================
// Opcodes (host → device)
// ============================================================================

/// Initial handshake command - requests device identity.
pub const OP_IDENTIFY: u8 = 0x01;
/// List the Connect IQ apps installed on the device.
pub const OP_LIST_INSTALLED: u8 = 0x02;
/// Query device status (activity, installed app count, free storage).
pub const OP_QUERY_STATUS: u8 = 0x03;
/// Announce an incoming transfer (kind, name, size, segment count).
pub const OP_TRANSFER_BEGIN: u8 = 0x10;
/// Send one segment of an in-progress transfer.
pub const OP_TRANSFER_SEGMENT: u8 = 0x11;
/// Commit a completed transfer.
pub const OP_TRANSFER_FINALIZE: u8 = 0x12;

// ============================================================================
// Status Codes (first payload byte of every device response)
// ============================================================================

/// Request acknowledged.
pub const STATUS_OK: u8 = 0;
/// No free application slot on the device.
pub const STATUS_SLOT_FULL: u8 = 1;
/// Package is not built for this device type.
pub const STATUS_INCOMPATIBLE: u8 = 2;
/// Segment arrived out of sequence or without a transfer in progress.
pub const STATUS_BAD_SEQUENCE: u8 = 3;
/// Device-side storage write failed.
pub const STATUS_STORAGE_FAILURE: u8 = 4;
/// Device is busy with another operation (e.g. an activity is recording).
pub const STATUS_BUSY: u8 = 5;

// ============================================================================
// Transfer Kinds (first byte of a TransferBegin payload)
// ============================================================================

/// Connect IQ application binary (.PRG).
pub const KIND_APPLICATION: u8 = 1;
/// Application settings blob (.SET).
pub const KIND_SETTINGS: u8 = 2;
/// Firmware/update payload.
pub const KIND_FIRMWARE: u8 = 3;

// ============================================================================
// Framing
// ============================================================================

/// Fixed frame header size: opcode (1) + payload length (2) + CRC-32 (4).
pub const FRAME_HEADER_SIZE: usize = 7;
/// Maximum payload bytes a single frame may carry.
pub const MAX_FRAME_PAYLOAD: usize = 2048;

// ============================================================================
// Transfer
// ============================================================================

/// Bytes of package payload carried per transfer segment.
pub const SEGMENT_SIZE: usize = 1024;

// ============================================================================
// Handshake
// ============================================================================

/// Highest protocol major version this implementation speaks.
pub const PROTOCOL_MAJOR: u8 = 2;
/// Protocol minor version advertised during the handshake.
pub const PROTOCOL_MINOR: u8 = 0;

// ============================================================================
// Sizes
// ============================================================================

/// Size of a Connect IQ store id in bytes.
pub const STORE_ID_SIZE: usize = 16;
/// Maximum length of a name field (apps, transfers) in bytes.
pub const MAX_NAME_LEN: usize = 255;
