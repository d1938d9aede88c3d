//! Serial acquisition transport
//!
//! The acquisition board is a line-oriented serial device: writing
//! `1\r\n` starts streaming, `0\r\n` stops it. `SampleSource` is the
//! seam between the session loop and the hardware so tests and the
//! demo generator can stand in for a real port.

use crate::{Error, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Baud rates accepted by the acquisition board
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

const START_COMMAND: &[u8] = b"1\r\n";
const STOP_COMMAND: &[u8] = b"0\r\n";

/// A line-oriented source of ECG samples
pub trait SampleSource: Send {
    /// Begin streaming
    fn start(&mut self) -> Result<()>;

    /// Stop streaming
    fn stop(&mut self) -> Result<()>;

    /// Read the next line, `None` when nothing arrived before timeout
    fn read_line(&mut self) -> Result<Option<String>>;

    /// True while the source is streaming
    fn is_running(&self) -> bool;
}

/// Serial-port implementation of `SampleSource`
pub struct SerialEcgReader {
    port: Box<dyn SerialPort>,
    running: bool,
}

impl std::fmt::Debug for SerialEcgReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialEcgReader")
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl SerialEcgReader {
    /// Open a serial port with a 1 second read timeout
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        if !SUPPORTED_BAUD_RATES.contains(&baud_rate) {
            return Err(Error::Serial(format!(
                "unsupported baud rate {}, expected one of {:?}",
                baud_rate, SUPPORTED_BAUD_RATES
            )));
        }

        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|e| Error::Serial(format!("failed to open {}: {}", port_name, e)))?;

        debug!("Opened serial port {} at {} baud", port_name, baud_rate);

        Ok(Self {
            port,
            running: false,
        })
    }
}

impl SampleSource for SerialEcgReader {
    fn start(&mut self) -> Result<()> {
        // Discard anything buffered before the start command
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| Error::Serial(format!("failed to clear input buffer: {}", e)))?;

        self.port
            .write_all(START_COMMAND)
            .map_err(|e| Error::Serial(format!("failed to send start command: {}", e)))?;

        std::thread::sleep(Duration::from_millis(500));
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.port
            .write_all(STOP_COMMAND)
            .map_err(|e| Error::Serial(format!("failed to send stop command: {}", e)))?;
        self.running = false;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if !self.running {
            return Ok(None);
        }

        // Byte-at-a-time readline; the port timeout bounds each read
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    raw.push(byte[0]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(Error::Serial(format!("read failed: {}", e))),
            }
        }

        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Names of serial ports present on this machine
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()
        .map_err(|e| Error::Serial(format!("failed to enumerate ports: {}", e)))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_baud_rates() {
        assert_eq!(SUPPORTED_BAUD_RATES.len(), 5);
        assert!(SUPPORTED_BAUD_RATES.contains(&9600));
        assert!(SUPPORTED_BAUD_RATES.contains(&115200));
        assert!(!SUPPORTED_BAUD_RATES.contains(&1200));
    }

    #[test]
    fn test_open_rejects_bad_baud() {
        let result = SerialEcgReader::open("/dev/null", 1234);
        assert!(result.is_err());
        assert!(format!("{}", result.unwrap_err()).contains("unsupported baud rate"));
    }

    #[test]
    fn test_open_missing_port() {
        // Opening a nonexistent device must surface a Serial error,
        // not panic
        let result = SerialEcgReader::open("/dev/pulsemon-does-not-exist", 9600);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_ports_does_not_panic() {
        // Port enumeration may be empty in CI but should not fail
        let result = list_ports();
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_commands_are_crlf_terminated() {
        assert_eq!(START_COMMAND, b"1\r\n");
        assert_eq!(STOP_COMMAND, b"0\r\n");
    }
}
