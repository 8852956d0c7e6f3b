//! Common types used in the protocol.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// A 16-byte Connect IQ store id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub [u8; STORE_ID_SIZE]);

impl StoreId {
    /// Create a new store id from bytes.
    pub fn new(bytes: [u8; STORE_ID_SIZE]) -> Self {
        StoreId(bytes)
    }

    /// Create from a slice. Returns None if slice is wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == STORE_ID_SIZE {
            let mut bytes = [0u8; STORE_ID_SIZE];
            bytes.copy_from_slice(slice);
            Some(StoreId(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; STORE_ID_SIZE] {
        &self.0
    }

    /// Get the bytes as a hex string.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }
}

impl Default for StoreId {
    fn default() -> Self {
        StoreId([0u8; STORE_ID_SIZE])
    }
}

impl AsRef<[u8]> for StoreId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A major.minor version pair, used for both firmware and protocol versions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl Version {
    /// Create a new version.
    pub fn new(major: u8, minor: u8) -> Self {
        Version { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Connect IQ application type, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppType {
    /// Unknown or unrecognized type.
    Unknown,
    /// Watch face.
    WatchFace,
    /// Full watch application.
    WatchApp,
    /// Glanceable widget.
    Widget,
    /// Activity data field.
    DataField,
    /// Audio content provider.
    MusicApp,
    /// Custom activity.
    Activity,
}

impl From<u8> for AppType {
    fn from(value: u8) -> Self {
        match value {
            1 => AppType::WatchFace,
            2 => AppType::WatchApp,
            3 => AppType::Widget,
            4 => AppType::DataField,
            5 => AppType::MusicApp,
            6 => AppType::Activity,
            _ => AppType::Unknown,
        }
    }
}

impl From<AppType> for u8 {
    fn from(value: AppType) -> Self {
        match value {
            AppType::Unknown => 0,
            AppType::WatchFace => 1,
            AppType::WatchApp => 2,
            AppType::Widget => 3,
            AppType::DataField => 4,
            AppType::MusicApp => 5,
            AppType::Activity => 6,
        }
    }
}

/// Kind of payload announced in a TransferBegin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// Connect IQ application binary.
    Application,
    /// Application settings blob.
    Settings,
    /// Firmware/update payload.
    Firmware,
}

impl PackageKind {
    /// Decode from the wire byte. Returns None for unknown kinds.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            KIND_APPLICATION => Some(PackageKind::Application),
            KIND_SETTINGS => Some(PackageKind::Settings),
            KIND_FIRMWARE => Some(PackageKind::Firmware),
            _ => None,
        }
    }
}

impl From<PackageKind> for u8 {
    fn from(kind: PackageKind) -> Self {
        match kind {
            PackageKind::Application => KIND_APPLICATION,
            PackageKind::Settings => KIND_SETTINGS,
            PackageKind::Firmware => KIND_FIRMWARE,
        }
    }
}

/// Device identity learned from the Identify response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Protocol version the device speaks.
    pub protocol: Version,
    /// Numeric device type id, matched against package compatibility lists.
    pub device_type_id: u16,
    /// Unit serial number.
    pub serial_number: u32,
    /// Installed firmware version.
    pub firmware: Version,
    /// Maximum number of Connect IQ apps the device can hold.
    pub max_apps: u8,
    /// Manufacturer part number (e.g. "006-B3415-00").
    pub part_number: String,
    /// Marketing product name (e.g. "fenix 7").
    pub product_name: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        DeviceIdentity {
            protocol: Version::new(PROTOCOL_MAJOR, PROTOCOL_MINOR),
            device_type_id: 0,
            serial_number: 0,
            firmware: Version::default(),
            max_apps: 0,
            part_number: String::new(),
            product_name: String::new(),
        }
    }
}

/// One installed app entry from a ListInstalled response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    /// Connect IQ store id.
    pub store_id: StoreId,
    /// Internal version number.
    pub version: u32,
    /// Application type.
    pub app_type: AppType,
    /// Display name.
    pub name: String,
}

/// What the device is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceActivity {
    /// Nothing in progress; safe to start a transfer.
    Idle,
    /// A transfer or install is being committed.
    Installing,
    /// The last install left the device in an error state.
    Error,
    /// Unrecognized activity byte, preserved raw.
    Unknown(u8),
}

impl From<u8> for DeviceActivity {
    fn from(value: u8) -> Self {
        match value {
            0 => DeviceActivity::Idle,
            1 => DeviceActivity::Installing,
            2 => DeviceActivity::Error,
            other => DeviceActivity::Unknown(other),
        }
    }
}

impl From<DeviceActivity> for u8 {
    fn from(value: DeviceActivity) -> Self {
        match value {
            DeviceActivity::Idle => 0,
            DeviceActivity::Installing => 1,
            DeviceActivity::Error => 2,
            DeviceActivity::Unknown(other) => other,
        }
    }
}

/// Device status from a QueryStatus response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Current device activity.
    pub activity: DeviceActivity,
    /// Number of Connect IQ apps currently installed.
    pub apps_installed: u8,
    /// Free storage in bytes.
    pub storage_free: u32,
}

/// Encode bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_id_from_slice() {
        assert!(StoreId::from_slice(&[0u8; 15]).is_none());
        let id = StoreId::from_slice(&[0xAB; 16]).unwrap();
        assert_eq!(id.to_hex(), "ab".repeat(16));
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(12, 30) > Version::new(12, 8));
        assert!(Version::new(13, 0) > Version::new(12, 99));
        assert_eq!(Version::new(9, 9).to_string(), "9.9");
    }

    #[test]
    fn test_app_type_roundtrip() {
        for raw in 0u8..=6 {
            assert_eq!(u8::from(AppType::from(raw)), raw);
        }
        assert_eq!(AppType::from(42), AppType::Unknown);
    }

    #[test]
    fn test_package_kind_unknown() {
        assert!(PackageKind::from_u8(0).is_none());
        assert_eq!(
            PackageKind::from_u8(u8::from(PackageKind::Firmware)),
            Some(PackageKind::Firmware)
        );
    }
}
