//! Update descriptors produced by the catalog collaborator.

use serde::{Deserialize, Serialize};

use garmin_wire::Version;

/// What an update targets. Orders a batch: firmware installs before apps,
/// apps before their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateClass {
    /// Firmware/update payload.
    Firmware,
    /// Connect IQ application.
    Application,
    /// Application settings blob.
    Settings,
}

impl UpdateClass {
    fn rank(self) -> u8 {
        match self {
            UpdateClass::Firmware => 0,
            UpdateClass::Application => 1,
            UpdateClass::Settings => 2,
        }
    }
}

/// One pending update, as resolved by the catalog collaborator.
///
/// Read-only for the core. Versions are the feed's scalar form: internal
/// version numbers for apps, `major * 100 + minor` for firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Display name.
    pub name: String,
    /// What the update targets.
    pub class: UpdateClass,
    /// Opaque reference the catalog resolves to package bytes.
    pub package_ref: String,
    /// Version currently on the device, if installed.
    #[serde(default)]
    pub current_version: Option<u32>,
    /// Version the catalog offers.
    pub available_version: u32,
    /// Expected package byte count, when the feed declares one.
    #[serde(default)]
    pub size: Option<u64>,
    /// Feed-assigned installation order within the batch.
    #[serde(default)]
    pub installation_order: u32,
    /// Lowest device firmware this update supports.
    #[serde(default)]
    pub min_firmware: Option<Version>,
    /// Highest device firmware this update supports.
    #[serde(default)]
    pub max_firmware: Option<Version>,
}

impl UpdateDescriptor {
    /// Whether the offered version is actually newer than what is
    /// installed. A missing current version means "not installed".
    pub fn is_upgrade(&self) -> bool {
        match self.current_version {
            Some(current) => self.available_version > current,
            None => true,
        }
    }
}

/// Order descriptors for installation: firmware before apps before
/// settings, then by the feed's installation order. Stable, so feed order
/// breaks remaining ties.
pub fn installation_order(descriptors: &[UpdateDescriptor]) -> Vec<&UpdateDescriptor> {
    let mut ordered: Vec<&UpdateDescriptor> = descriptors.iter().collect();
    ordered.sort_by_key(|d| (d.class.rank(), d.installation_order));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, class: UpdateClass, order: u32) -> UpdateDescriptor {
        UpdateDescriptor {
            name: name.to_string(),
            class,
            package_ref: format!("ref:{name}"),
            current_version: None,
            available_version: 1,
            size: None,
            installation_order: order,
            min_firmware: None,
            max_firmware: None,
        }
    }

    #[test]
    fn test_firmware_sorts_before_apps() {
        let descriptors = vec![
            descriptor("settings", UpdateClass::Settings, 0),
            descriptor("app", UpdateClass::Application, 0),
            descriptor("tooth", UpdateClass::Firmware, 2),
            descriptor("primary", UpdateClass::Firmware, 1),
        ];
        let names: Vec<&str> = installation_order(&descriptors)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["primary", "tooth", "app", "settings"]);
    }

    #[test]
    fn test_is_upgrade() {
        let mut d = descriptor("app", UpdateClass::Application, 0);
        d.available_version = 5;
        assert!(d.is_upgrade());
        d.current_version = Some(5);
        assert!(!d.is_upgrade());
        d.current_version = Some(4);
        assert!(d.is_upgrade());
    }

    #[test]
    fn test_descriptor_json_roundtrip() {
        let full = UpdateDescriptor {
            name: "fenix 7 System Software".to_string(),
            class: UpdateClass::Firmware,
            package_ref: "urn:fw:006-B3415-00:12.30".to_string(),
            current_version: Some(1208),
            available_version: 1230,
            size: Some(4096),
            installation_order: 1,
            min_firmware: None,
            max_firmware: None,
        };
        let json = serde_json::to_string(&full).unwrap();
        assert_eq!(serde_json::from_str::<UpdateDescriptor>(&json).unwrap(), full);
    }

    #[test]
    fn test_descriptor_minimal_json() {
        let parsed: UpdateDescriptor = serde_json::from_str(
            r#"{
                "name": "Infocal",
                "class": "application",
                "package_ref": "ciq:abc",
                "available_version": 41
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.class, UpdateClass::Application);
        assert_eq!(parsed.current_version, None);
        assert_eq!(parsed.installation_order, 0);
        assert!(parsed.is_upgrade());
    }

    #[test]
    fn test_firmware_window_fields_parse() {
        let parsed: UpdateDescriptor = serde_json::from_str(
            r#"{
                "name": "Stryd Zones",
                "class": "application",
                "package_ref": "ciq:def",
                "available_version": 7,
                "min_firmware": { "major": 10, "minor": 0 },
                "max_firmware": { "major": 13, "minor": 99 }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.min_firmware, Some(Version::new(10, 0)));
        assert_eq!(parsed.max_firmware, Some(Version::new(13, 99)));
    }
}
