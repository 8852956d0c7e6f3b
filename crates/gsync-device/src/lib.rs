//! Device transport and session layer.
//!
//! This crate owns the two stateful pieces of the stack: the byte
//! [`Transport`] to one physical device (with a serial implementation over
//! the `serialport` crate) and the [`DeviceSession`] state machine that
//! drives the framed request/response protocol from `garmin-wire`.
//!
//! One handle, one session, one in-flight request: callers that manage
//! several devices run one independent session per handle. There is no
//! background thread and no shared state; every operation blocks with a
//! caller-visible timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use gsync_device::{DeviceSession, SerialTransport};
//!
//! let transport = SerialTransport::open("/dev/ttyACM0")?;
//! let mut session = DeviceSession::new(transport);
//! let identity = session.connect()?;
//! println!("{} ({})", identity.product_name, identity.part_number);
//! for app in session.list_installed()? {
//!     println!("  {} v{}", app.name, app.version);
//! }
//! session.disconnect();
//! ```

mod error;
mod serial;
mod session;
mod transport;

pub use error::*;
pub use serial::*;
pub use session::*;
pub use transport::*;
