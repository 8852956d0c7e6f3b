//! Container encoding and decoding.
//!
//! All three formats share the outer structure documented in the crate
//! docs; only the metadata block differs:
//!
//! - application: store_id(16) + version(4) + app_type(1) + has_settings(1)
//!   + compat_count(1) + compat_ids(2 each) + name(1 + N)
//! - settings: store_id(16) + version(4) + compat_count(1)
//!   + compat_ids(2 each) + name(1 + N)
//! - firmware: fw_major(1) + fw_minor(1) + kind(1) + severity(1)
//!   + restart(1) + part_number(1 + N)
//!
//! All multi-byte integers are little-endian. The trailing CRC-32 uses the
//! same pinned algorithm as the wire frames.

use garmin_wire::{crc32, AppType, StoreId, Version};

use crate::error::PackageError;
use crate::types::{
    ApplicationMeta, ApplicationPackage, ChangeSeverity, FirmwareMeta, FirmwarePackage, Package,
    SettingsMeta, SettingsPackage, UpdateKind, CONTAINER_VERSION, MAGIC_APPLICATION,
    MAGIC_FIRMWARE, MAGIC_SETTINGS,
};

// ============================================================================
// Encoding
// ============================================================================

/// Serialize a package to container bytes.
///
/// Total inverse of [`decode_package`]: any successfully parsed package
/// re-encodes to the exact bytes it was parsed from.
pub fn encode_package(package: &Package) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + package.payload().len());

    match package {
        Package::Application(pkg) => {
            buf.extend_from_slice(&MAGIC_APPLICATION);
            buf.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
            buf.extend_from_slice(pkg.meta.store_id.as_bytes());
            buf.extend_from_slice(&pkg.meta.version.to_le_bytes());
            buf.push(u8::from(pkg.meta.app_type));
            buf.push(pkg.meta.has_settings as u8);
            push_compat_list(&mut buf, &pkg.meta.compatible_devices);
            push_string(&mut buf, &pkg.meta.name);
            push_payload(&mut buf, &pkg.payload);
        }

        Package::Settings(pkg) => {
            buf.extend_from_slice(&MAGIC_SETTINGS);
            buf.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
            buf.extend_from_slice(pkg.meta.store_id.as_bytes());
            buf.extend_from_slice(&pkg.meta.version.to_le_bytes());
            push_compat_list(&mut buf, &pkg.meta.compatible_devices);
            push_string(&mut buf, &pkg.meta.name);
            push_payload(&mut buf, &pkg.payload);
        }

        Package::Firmware(pkg) => {
            buf.extend_from_slice(&MAGIC_FIRMWARE);
            buf.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
            buf.push(pkg.meta.version.major);
            buf.push(pkg.meta.version.minor);
            buf.push(u8::from(pkg.meta.kind));
            buf.push(u8::from(pkg.meta.severity));
            buf.push(pkg.meta.restart_required as u8);
            push_string(&mut buf, &pkg.meta.part_number);
            push_payload(&mut buf, &pkg.payload);
        }
    }

    let checksum = crc32(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

fn push_compat_list(buf: &mut Vec<u8>, ids: &[u16]) {
    buf.push(ids.len() as u8);
    for id in ids {
        buf.extend_from_slice(&id.to_le_bytes());
    }
}

fn push_string(buf: &mut Vec<u8>, value: &str) {
    let bytes = value.as_bytes();
    buf.push(bytes.len().min(255) as u8);
    buf.extend_from_slice(&bytes[..bytes.len().min(255)]);
}

fn push_payload(buf: &mut Vec<u8>, payload: &[u8]) {
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
}

// ============================================================================
// Decoding
// ============================================================================

/// Parse a package from container bytes.
///
/// The trailing checksum is validated here, before the package can ever
/// reach a device; a package that parses is safe to transmit.
pub fn decode_package(data: &[u8]) -> Result<Package, PackageError> {
    let mut offset = 0;

    let mut magic = [0u8; 4];
    magic.copy_from_slice(read_bytes(data, &mut offset, 4)?);
    if magic != MAGIC_APPLICATION && magic != MAGIC_SETTINGS && magic != MAGIC_FIRMWARE {
        return Err(PackageError::BadMagic { found: magic });
    }

    let version = read_u16(data, &mut offset)?;
    if version != CONTAINER_VERSION {
        return Err(PackageError::UnsupportedVersion { found: version });
    }

    let package = if magic == MAGIC_APPLICATION {
        let store_id = read_store_id(data, &mut offset)?;
        let app_version = read_u32(data, &mut offset)?;
        let app_type = AppType::from(read_u8(data, &mut offset)?);
        let has_settings = read_u8(data, &mut offset)? != 0;
        let compatible_devices = read_compat_list(data, &mut offset)?;
        let name = read_string(data, &mut offset)?;
        let payload = read_payload(data, &mut offset)?;
        Package::Application(ApplicationPackage {
            meta: ApplicationMeta {
                store_id,
                version: app_version,
                app_type,
                has_settings,
                compatible_devices,
                name,
            },
            payload,
        })
    } else if magic == MAGIC_SETTINGS {
        let store_id = read_store_id(data, &mut offset)?;
        let app_version = read_u32(data, &mut offset)?;
        let compatible_devices = read_compat_list(data, &mut offset)?;
        let name = read_string(data, &mut offset)?;
        let payload = read_payload(data, &mut offset)?;
        Package::Settings(SettingsPackage {
            meta: SettingsMeta {
                store_id,
                version: app_version,
                compatible_devices,
                name,
            },
            payload,
        })
    } else {
        let fw_version = Version::new(read_u8(data, &mut offset)?, read_u8(data, &mut offset)?);
        let kind_offset = offset;
        let kind = UpdateKind::from_u8(read_u8(data, &mut offset)?)
            .ok_or_else(|| PackageError::invalid_at(kind_offset, "unknown update kind"))?;
        let severity_offset = offset;
        let severity = ChangeSeverity::from_u8(read_u8(data, &mut offset)?)
            .ok_or_else(|| PackageError::invalid_at(severity_offset, "unknown change severity"))?;
        let restart_required = read_u8(data, &mut offset)? != 0;
        let part_number = read_string(data, &mut offset)?;
        let payload = read_payload(data, &mut offset)?;
        Package::Firmware(FirmwarePackage {
            meta: FirmwareMeta {
                part_number,
                version: fw_version,
                kind,
                severity,
                restart_required,
            },
            payload,
        })
    };

    let content_end = offset;
    let expected = read_u32(data, &mut offset)?;
    if offset != data.len() {
        return Err(PackageError::TrailingBytes {
            extra: data.len() - offset,
        });
    }
    let actual = crc32(&data[..content_end]);
    if actual != expected {
        return Err(PackageError::ChecksumMismatch { expected, actual });
    }

    Ok(package)
}

fn read_u8(data: &[u8], offset: &mut usize) -> Result<u8, PackageError> {
    Ok(read_bytes(data, offset, 1)?[0])
}

fn read_u16(data: &[u8], offset: &mut usize) -> Result<u16, PackageError> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: &mut usize) -> Result<u32, PackageError> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_bytes<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: usize,
) -> Result<&'a [u8], PackageError> {
    if *offset + len > data.len() {
        return Err(PackageError::Truncated {
            expected: *offset + len,
            actual: data.len(),
        });
    }
    let slice = &data[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}

fn read_store_id(data: &[u8], offset: &mut usize) -> Result<StoreId, PackageError> {
    let bytes = read_bytes(data, offset, garmin_wire::STORE_ID_SIZE)?;
    Ok(StoreId::from_slice(bytes).unwrap_or_default())
}

fn read_compat_list(data: &[u8], offset: &mut usize) -> Result<Vec<u16>, PackageError> {
    let count = read_u8(data, offset)? as usize;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(read_u16(data, offset)?);
    }
    Ok(ids)
}

fn read_string(data: &[u8], offset: &mut usize) -> Result<String, PackageError> {
    let len = read_u8(data, offset)? as usize;
    let bytes = read_bytes(data, offset, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| PackageError::InvalidUtf8)
}

fn read_payload(data: &[u8], offset: &mut usize) -> Result<Vec<u8>, PackageError> {
    let len = read_u32(data, offset)? as usize;
    Ok(read_bytes(data, offset, len)?.to_vec())
}

// ============================================================================
// Tests
// ============================================================================
