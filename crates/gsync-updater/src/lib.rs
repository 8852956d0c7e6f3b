//! Update orchestration for Garmin wearables.
//!
//! Consumes [`UpdateDescriptor`]s from a [`Catalog`] collaborator, verifies
//! each package against the connected device's identity, and drives a
//! `gsync-device` session through a sequential batch of installs. The
//! outcome is a [`BatchReport`] that accounts for every descriptor:
//! succeeded, failed (with reason), skipped, or never attempted.
//!
//! # Example
//!
//! ```rust,ignore
//! use gsync_device::{DeviceSession, SerialTransport};
//! use gsync_updater::{run_batch, MemoryCatalog};
//!
//! let mut session = DeviceSession::new(SerialTransport::open("/dev/ttyACM0")?);
//! session.connect()?;
//!
//! let report = run_batch(&mut session, &catalog, &descriptors, |d, p| {
//!     println!("{}: {}/{}", d.name, p.segments_sent, p.segments_total);
//! })?;
//! println!("{} installed, {} failed", report.succeeded.len(), report.failed.len());
//! ```

mod batch;
mod catalog;
mod descriptor;
mod error;

pub use batch::*;
pub use catalog::*;
pub use descriptor::*;
pub use error::*;
