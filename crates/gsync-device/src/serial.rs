//! Serial port transport.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::Transport;

/// Baud rate the device enumerates at. Captured traffic shows the official
/// client always opens the port with these settings.
pub const BAUD_RATE: u32 = 115_200;

/// Transport over a platform serial device path (`/dev/ttyACM0`,
/// `COM3`, ...). The path is treated as opaque.
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    path: String,
}

impl SerialTransport {
    /// Open the serial endpoint at `path`.
    pub fn open(path: &str) -> Result<Self, TransportError> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(500))
            .open()
            .map_err(|err| TransportError::Connection(format!("{path}: {err}")))?;
        log::debug!("opened serial port {path} at {BAUD_RATE} baud");
        Ok(SerialTransport {
            port: Some(port),
            path: path.to_string(),
        })
    }

    /// The device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn port(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, TransportError> {
        self.port
            .as_mut()
            .ok_or_else(|| TransportError::Connection("port is closed".to_string()))
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        let port = self.port()?;
        port.set_timeout(timeout)?;
        match port.read(buf) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == std::io::ErrorKind::TimedOut => {
                Err(TransportError::Timeout(timeout))
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            log::debug!("closed serial port {}", self.path);
        }
        Ok(())
    }
}
