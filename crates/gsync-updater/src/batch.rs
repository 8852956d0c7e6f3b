//! Sequential batch driver.
//!
//! One device handle means one session and strictly sequential installs.
//! The device has no transactional rollback primitive, so the driver's job
//! on failure is accurate reporting, not recovery: every descriptor ends up
//! in exactly one report bucket.

use serde::{Deserialize, Serialize};

use garmin_package::decode_package;
use garmin_wire::DeviceIdentity;
use gsync_device::{DeviceSession, PushProgress, Transport};

use crate::catalog::Catalog;
use crate::descriptor::{installation_order, UpdateDescriptor};
use crate::error::UpdateError;

/// One failed update with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpdate {
    /// Descriptor name.
    pub name: String,
    /// Why it failed.
    pub error: String,
}

/// Outcome of a batch run. The four buckets are disjoint and cover every
/// descriptor that went in.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Installed and committed on the device.
    pub succeeded: Vec<String>,
    /// Attempted and failed (reason attached).
    pub failed: Vec<FailedUpdate>,
    /// Not attempted because the offered version is not newer.
    pub skipped: Vec<String>,
    /// Never attempted because the batch halted first.
    pub not_attempted: Vec<String>,
}

impl BatchReport {
    /// Whether every attempted update succeeded and none were cut off.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.not_attempted.is_empty()
    }
}

/// Run a batch of updates against a connected session.
///
/// Descriptors are installed in [`installation_order`]. Updates whose
/// offered version is not newer are skipped. A failure that touched the
/// device (any session error, including an `Incomplete` transfer) halts the
/// batch; the rest is reported as not attempted. Failures that never
/// reached the device (catalog, parse, compatibility, size) fail only their
/// own update.
///
/// `progress` receives per-segment transfer progress for the descriptor
/// currently being pushed.
pub fn run_batch<T, C, F>(
    session: &mut DeviceSession<T>,
    catalog: &C,
    descriptors: &[UpdateDescriptor],
    mut progress: F,
) -> Result<BatchReport, UpdateError>
where
    T: Transport,
    C: Catalog + ?Sized,
    F: FnMut(&UpdateDescriptor, PushProgress),
{
    let identity = session.identity().cloned().ok_or(UpdateError::NotConnected)?;

    let ordered = installation_order(descriptors);
    let mut report = BatchReport::default();

    let mut halted = false;
    for (position, descriptor) in ordered.iter().enumerate() {
        if halted {
            report.not_attempted.push(descriptor.name.clone());
            continue;
        }
        if !descriptor.is_upgrade() {
            log::debug!(
                "skipping '{}': version {} is not newer",
                descriptor.name,
                descriptor.available_version
            );
            report.skipped.push(descriptor.name.clone());
            continue;
        }

        match apply_update(session, catalog, &identity, descriptor, &mut progress) {
            Ok(()) => {
                log::info!("installed '{}'", descriptor.name);
                report.succeeded.push(descriptor.name.clone());
            }
            Err(err) => {
                log::warn!("update '{}' failed: {err}", descriptor.name);
                let halts = err.halts_batch();
                report.failed.push(FailedUpdate {
                    name: descriptor.name.clone(),
                    error: err.to_string(),
                });
                if halts {
                    log::warn!(
                        "halting batch: {} of {} updates never attempted",
                        ordered.len() - position - 1,
                        ordered.len()
                    );
                    halted = true;
                }
            }
        }
    }

    Ok(report)
}

fn apply_update<T, C, F>(
    session: &mut DeviceSession<T>,
    catalog: &C,
    identity: &DeviceIdentity,
    descriptor: &UpdateDescriptor,
    progress: &mut F,
) -> Result<(), UpdateError>
where
    T: Transport,
    C: Catalog + ?Sized,
    F: FnMut(&UpdateDescriptor, PushProgress),
{
    let bytes = catalog.fetch_package(descriptor)?;
    if let Some(expected) = descriptor.size {
        if bytes.len() as u64 != expected {
            return Err(UpdateError::SizeMismatch {
                expected,
                actual: bytes.len() as u64,
            });
        }
    }

    let package = decode_package(&bytes)?;

    if !package.compatible_with(identity) {
        return Err(UpdateError::Incompatible(format!(
            "'{}' does not target {} (device type {})",
            package.name(),
            identity.part_number,
            identity.device_type_id
        )));
    }
    if let Some(min) = descriptor.min_firmware {
        if identity.firmware < min {
            return Err(UpdateError::Incompatible(format!(
                "'{}' requires firmware {min} or newer, device has {}",
                descriptor.name, identity.firmware
            )));
        }
    }
    if let Some(max) = descriptor.max_firmware {
        if identity.firmware > max {
            return Err(UpdateError::Incompatible(format!(
                "'{}' supports firmware up to {max}, device has {}",
                descriptor.name, identity.firmware
            )));
        }
    }

    session.push(&package, |p| progress(descriptor, p))?;
    Ok(())
}
