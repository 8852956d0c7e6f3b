//! Package types and metadata blocks.

use garmin_wire::{AppType, DeviceIdentity, PackageKind, StoreId, Version};

/// Magic tag of an application container.
pub const MAGIC_APPLICATION: [u8; 4] = *b"GAPP";
/// Magic tag of a settings container.
pub const MAGIC_SETTINGS: [u8; 4] = *b"GSET";
/// Magic tag of a firmware/update container.
pub const MAGIC_FIRMWARE: [u8; 4] = *b"GFWU";
/// Container format version this implementation understands.
pub const CONTAINER_VERSION: u16 = 1;

/// A parsed package container of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    /// Connect IQ application binary.
    Application(ApplicationPackage),
    /// Application settings blob.
    Settings(SettingsPackage),
    /// Firmware/update payload.
    Firmware(FirmwarePackage),
}

impl Package {
    /// The transfer kind announced to the device for this package.
    pub fn kind(&self) -> PackageKind {
        match self {
            Package::Application(_) => PackageKind::Application,
            Package::Settings(_) => PackageKind::Settings,
            Package::Firmware(_) => PackageKind::Firmware,
        }
    }

    /// Display name of the package.
    pub fn name(&self) -> &str {
        match self {
            Package::Application(pkg) => &pkg.meta.name,
            Package::Settings(pkg) => &pkg.meta.name,
            Package::Firmware(pkg) => &pkg.meta.part_number,
        }
    }

    /// The opaque device payload to transfer.
    pub fn payload(&self) -> &[u8] {
        match self {
            Package::Application(pkg) => &pkg.payload,
            Package::Settings(pkg) => &pkg.payload,
            Package::Firmware(pkg) => &pkg.payload,
        }
    }

    /// Whether this package targets the connected device.
    ///
    /// Application and settings containers carry a compatible device-type id
    /// list; firmware containers are matched by part number. A mismatch is
    /// never coerced; callers report it.
    pub fn compatible_with(&self, identity: &DeviceIdentity) -> bool {
        match self {
            Package::Application(pkg) => pkg
                .meta
                .compatible_devices
                .contains(&identity.device_type_id),
            Package::Settings(pkg) => pkg
                .meta
                .compatible_devices
                .contains(&identity.device_type_id),
            Package::Firmware(pkg) => pkg.meta.part_number == identity.part_number,
        }
    }
}

/// A Connect IQ application binary with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPackage {
    /// Application metadata.
    pub meta: ApplicationMeta,
    /// Device-executable bytes, opaque to the host.
    pub payload: Vec<u8>,
}

/// Metadata block of an application container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMeta {
    /// Connect IQ store id.
    pub store_id: StoreId,
    /// Internal version number.
    pub version: u32,
    /// Application type.
    pub app_type: AppType,
    /// Whether a settings blob exists for this app.
    pub has_settings: bool,
    /// Device-type ids this binary was built for.
    pub compatible_devices: Vec<u16>,
    /// Display name.
    pub name: String,
}

/// An application settings blob with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPackage {
    /// Settings metadata.
    pub meta: SettingsMeta,
    /// Configuration bytes, opaque to the host.
    pub payload: Vec<u8>,
}

/// Metadata block of a settings container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsMeta {
    /// Store id of the app these settings belong to.
    pub store_id: StoreId,
    /// Internal version of the app the blob was generated for.
    pub version: u32,
    /// Device-type ids the blob was generated for.
    pub compatible_devices: Vec<u16>,
    /// Display name.
    pub name: String,
}

/// A firmware/update payload with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwarePackage {
    /// Firmware metadata.
    pub meta: FirmwareMeta,
    /// Update payload bytes, opaque to the host.
    pub payload: Vec<u8>,
}

/// Metadata block of a firmware container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareMeta {
    /// Target part number; must match the connected device exactly.
    pub part_number: String,
    /// Firmware version carried by the payload.
    pub version: Version,
    /// What the update contains.
    pub kind: UpdateKind,
    /// How urgent the update feed considers this change.
    pub severity: ChangeSeverity,
    /// Whether the device restarts after committing the update.
    pub restart_required: bool,
}

/// What a firmware/update container carries.
///
/// Values match the `DataType` field of the update feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// The primary device firmware.
    PrimaryFirmware,
    /// Secondary firmware (sensor hub, wifi chip, ...).
    Firmware,
    /// Map data.
    Map,
    /// Garage assets.
    Garage,
    /// Bike computer payload.
    Computer,
    /// Language pack.
    LanguagePack,
    /// Connect feature item.
    ConnectItem,
    /// Preloaded application.
    Application,
    /// Safety camera database.
    SafetyCamera,
    /// Marine chart data.
    MarineChart,
    /// Other downloadable content.
    GeneralDlc,
}

impl UpdateKind {
    /// Decode from the wire byte. Returns None for unknown kinds.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(UpdateKind::PrimaryFirmware),
            1 => Some(UpdateKind::Firmware),
            2 => Some(UpdateKind::Map),
            3 => Some(UpdateKind::Garage),
            4 => Some(UpdateKind::Computer),
            5 => Some(UpdateKind::LanguagePack),
            6 => Some(UpdateKind::ConnectItem),
            7 => Some(UpdateKind::Application),
            8 => Some(UpdateKind::SafetyCamera),
            9 => Some(UpdateKind::MarineChart),
            10 => Some(UpdateKind::GeneralDlc),
            _ => None,
        }
    }
}

impl From<UpdateKind> for u8 {
    fn from(kind: UpdateKind) -> Self {
        match kind {
            UpdateKind::PrimaryFirmware => 0,
            UpdateKind::Firmware => 1,
            UpdateKind::Map => 2,
            UpdateKind::Garage => 3,
            UpdateKind::Computer => 4,
            UpdateKind::LanguagePack => 5,
            UpdateKind::ConnectItem => 6,
            UpdateKind::Application => 7,
            UpdateKind::SafetyCamera => 8,
            UpdateKind::MarineChart => 9,
            UpdateKind::GeneralDlc => 10,
        }
    }
}

/// Urgency of a firmware change, as flagged by the update feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSeverity {
    /// No severity given.
    Unspecified,
    /// Critical fix.
    Critical,
    /// Recommended update.
    Recommended,
    /// Optional update.
    Optional,
}

impl ChangeSeverity {
    /// Decode from the wire byte. Returns None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ChangeSeverity::Unspecified),
            1 => Some(ChangeSeverity::Critical),
            2 => Some(ChangeSeverity::Recommended),
            3 => Some(ChangeSeverity::Optional),
            _ => None,
        }
    }
}

impl From<ChangeSeverity> for u8 {
    fn from(severity: ChangeSeverity) -> Self {
        match severity {
            ChangeSeverity::Unspecified => 0,
            ChangeSeverity::Critical => 1,
            ChangeSeverity::Recommended => 2,
            ChangeSeverity::Optional => 3,
        }
    }
}
