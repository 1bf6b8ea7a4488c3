//! # Serial Communication Module
//!
//! Line-oriented, non-blocking access to the sensor's serial port.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control, zero read timeout)
//! - Clearing stale input/output on connect
//! - Reading whatever bytes are buffered without blocking
//! - Framing the byte stream into text lines

pub mod framer;

use std::io::{self, Read};
use std::time::Duration;

use crate::error::{ImuScopeError, Result};
use framer::LineFramer;
use tracing::{debug, info, warn};

/// Largest single read from the port
const READ_CHUNK_SIZE: usize = 1024;

/// Source of complete text lines
///
/// `read_line` must not block: it returns `Ok(None)` when no complete line
/// is available yet and `Err(ImuScopeError::ConnectionLost)` once the
/// underlying connection is gone.
#[cfg_attr(test, mockall::automock)]
pub trait LineSource {
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Sensor serial port handler
pub struct SerialLineSource {
    port: Box<dyn tokio_serial::SerialPort>,
    framer: LineFramer,
    device_path: String,
}

impl std::fmt::Debug for SerialLineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLineSource")
            .field("device_path", &self.device_path)
            .field("pending", &self.framer.pending())
            .finish_non_exhaustive()
    }
}

impl SerialLineSource {
    /// Open the first device in `paths` that accepts a connection
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried if none opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imu_scope::serial::SerialLineSource;
    ///
    /// let source = SerialLineSource::open_with_paths(&["/dev/ttyUSB0"], 115_200)?;
    /// println!("Connected to: {}", source.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened sensor port at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        framer: LineFramer::new(),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(ImuScopeError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<Box<dyn tokio_serial::SerialPort>> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|e| ImuScopeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        port.clear(tokio_serial::ClearBuffer::All)
            .map_err(|e| ImuScopeError::Serial(format!("Failed to clear {}: {}", path, e)))?;

        Ok(port)
    }

    /// Path of the opened device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    fn fill(&mut self) -> Result<()> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| ImuScopeError::ConnectionLost(e.to_string()))? as usize;
        if available == 0 {
            return Ok(());
        }

        let mut chunk = vec![0u8; available.min(READ_CHUNK_SIZE)];
        match self.port.read(&mut chunk) {
            Ok(0) => Err(ImuScopeError::ConnectionLost("port closed".to_string())),
            Ok(n) => {
                self.framer.push(&chunk[..n]);
                Ok(())
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => Ok(()),
            Err(e) => Err(ImuScopeError::ConnectionLost(e.to_string())),
        }
    }
}

impl LineSource for SerialLineSource {
    fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.framer.next_line() {
            return Ok(Some(line));
        }
        self.fill()?;
        Ok(self.framer.next_line())
    }
}
