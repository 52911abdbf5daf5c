use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::{Link, PortInfo, RangefinderConfig, RangefinderError, Result};

/// Sensor attached to a local serial port (8N1, no flow control).
pub struct SerialLink {
    port_name: String,
    port: Box<dyn SerialPort>,
    acc: Vec<u8>,
}

impl SerialLink {
    /// Pop the next complete, non-empty line from the receive buffer.
    fn take_line(&mut self) -> Result<Option<String>> {
        while let Some(pos) = self.acc.iter().position(|&b| b == b'\r' || b == b'\n') {
            let line = self.acc.drain(..=pos).collect::<Vec<u8>>();
            let trim = &line[..line.len() - 1];
            if trim.is_empty() {
                continue;
            }
            return String::from_utf8(trim.to_vec())
                .map(Some)
                .map_err(|_| RangefinderError::InvalidResponse("non-ASCII reply".to_string()));
        }
        Ok(None)
    }
}

impl Link for SerialLink {
    fn open(port: &str, config: &RangefinderConfig) -> Result<Self> {
        let handle = serialport::new(port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.poll_interval_ms.max(1)))
            .open()
            .map_err(|e| RangefinderError::Open {
                port: port.to_string(),
                source: io::Error::from(e),
            })?;
        debug!(port, baud = config.baud_rate, "serial port open");
        Ok(Self {
            port_name: port.to_string(),
            port: handle,
            acc: Vec::with_capacity(64),
        })
    }

    fn list() -> Result<Vec<PortInfo>> {
        let ports =
            serialport::available_ports().map_err(|e| RangefinderError::Io(e.to_string()))?;
        Ok(ports
            .into_iter()
            .map(|p| {
                let driver = match p.port_type {
                    SerialPortType::UsbPort(_) => "usb-serial",
                    _ => "serial",
                };
                PortInfo {
                    name: p.port_name,
                    driver: driver.to_string(),
                }
            })
            .collect())
    }

    fn port(&self) -> &str {
        &self.port_name
    }

    fn clear_input(&mut self) -> Result<()> {
        self.acc.clear();
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| RangefinderError::Io(e.to_string()))
    }

    fn send(&mut self, line: &str) -> Result<()> {
        let mut out = Vec::with_capacity(line.len() + 2);
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
        self.port
            .write_all(&out)
            .and_then(|_| self.port.flush())
            .map_err(|e| RangefinderError::Io(e.to_string()))
    }

    fn recv(&mut self, timeout_ms: Option<u64>) -> Result<String> {
        let deadline = timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        let mut buf = [0u8; 64];
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(line);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(RangefinderError::Timeout);
            }
            // the port timeout is only the poll granularity
            match self.port.read(&mut buf) {
                Ok(n) => self.acc.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(RangefinderError::Io(e.to_string())),
            }
        }
    }
}
