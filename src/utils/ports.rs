//! Serial port device manipulation.

use std::io::{self, Write};

use log::{debug, info, warn};
use serialport::{available_ports, SerialPort, SerialPortInfo, SerialPortType};

use crate::Settings;

//==============================================================================
// Public Interface
//==============================================================================

/// The write side of a connection to the board console.
pub trait ByteSink {
    /// Name of the underlying port, used in diagnostics.
    fn name(&self) -> String;

    /// Writes all of `bytes` as a single write and waits until they have been
    /// handed over to the line.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Opens connections to the board console.
pub trait PortOpener {
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn ByteSink>, serialport::Error>;
}

/// Opens real serial ports with the `serialport` crate.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialPortOpener;
impl PortOpener for SerialPortOpener {
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn ByteSink>, serialport::Error> {
        let port = open_and_setup_port(settings)?;
        Ok(Box::new(SerialSink { port }))
    }
}

/// A [`ByteSink`] over an open serial port.
pub struct SerialSink {
    port: Box<dyn SerialPort>,
}
impl ByteSink for SerialSink {
    fn name(&self) -> String {
        self.port.name().unwrap_or_default()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }
}

/// Lists the serial ports detected on the system. USB ports are decorated
/// with the manufacturer and product of the serial controller.
pub fn available_serial_ports() -> Result<Vec<String>, serialport::Error> {
    Ok(available_ports()?.iter().map(describe_port).collect())
}

pub(crate) fn open_and_setup_port(
    settings: &Settings,
) -> Result<Box<dyn SerialPort>, serialport::Error> {
    use retry::{delay, retry_with_index};

    let path = match &settings.path {
        Some(path) => path.clone(),
        None => {
            return Err(serialport::Error::new(
                serialport::ErrorKind::InvalidInput,
                "no serial port path",
            ))
        }
    };

    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(settings.open_attempts.saturating_sub(1)),
        |index| -> Result<Box<dyn SerialPort>, serialport::Error> {
            debug!("Trying to connect {} ({})", path, index);
            open_port(&path, settings)
        },
    );
    match result {
        Ok(port) => {
            info!(
                "Connected to {} at {} baud",
                port.name().unwrap_or_else(|| path.clone()),
                port.baud_rate()?
            );
            debug!("data_bits    : {:#?}", port.data_bits()?);
            debug!("stop_bits    : {:#?}", port.stop_bits()?);
            debug!("parity       : {:#?}", port.parity()?);
            debug!("flow control : {:#?}", port.flow_control()?);

            let actual = port.baud_rate()?;
            if actual != settings.baud_rate {
                warn!(
                    "port {} reports {} baud instead of the requested {}",
                    path, actual, settings.baud_rate
                );
            }

            Ok(port)
        }
        Err(err) => match err {
            retry::Error::Operation {
                error,
                total_delay,
                tries,
            } => {
                info!(
                    "Failed to open the port after {:?} and {} tries: {}",
                    total_delay, tries, error,
                );
                Err(error)
            }
            retry::Error::Internal(_) => {
                info!("Internal retry error while opening port");
                Err(serialport::Error::new(
                    serialport::ErrorKind::Unknown,
                    "internal error while retrying to open the port",
                ))
            }
        },
    }
}

//==============================================================================
// Private stuff
//==============================================================================

fn builder(path: &str, settings: &Settings) -> serialport::SerialPortBuilder {
    serialport::new(path, settings.baud_rate)
        .data_bits(settings.data_bits)
        .stop_bits(settings.stop_bits)
        .parity(settings.parity)
        .flow_control(settings.flow_control)
}

/// On unix, ports are locked with `TIOCEXCL` when opened. The board console is
/// often watched by a terminal at the same time, so the lock is dropped
/// unless asked otherwise.
#[cfg(unix)]
fn open_port(path: &str, settings: &Settings) -> Result<Box<dyn SerialPort>, serialport::Error> {
    let mut port = builder(path, settings).open_native()?;
    port.set_exclusive(settings.exclusive)?;
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_port(path: &str, settings: &Settings) -> Result<Box<dyn SerialPort>, serialport::Error> {
    builder(path, settings).open()
}

fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(info) => format!(
            "{}: ({} / {})",
            port.port_name,
            info.manufacturer.as_ref().map_or("", String::as_str),
            info.product.as_ref().map_or("", String::as_str)
        ),
        _ => port.port_name.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
