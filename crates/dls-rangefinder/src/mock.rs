use std::collections::VecDeque;
use tracing::debug;

use crate::{
    Command, Link, MeasuringCharacteristic, PortInfo, RangefinderConfig, RangefinderError,
    Reply, Result,
};

/// Syntax error code answered to malformed commands.
const E_SYNTAX: u16 = 203;

/// An in-process simulated sensor.
///
/// Answers every command the way a real module would, keeping its
/// calibration in memory. Replies can be overridden one command at a time
/// with [`MockLink::script`] to exercise error paths.
pub struct MockLink {
    port: String,
    address: u8,
    distance: i32,
    temperature: i32,
    quality: i32,
    offset: i32,
    gain: (i32, i32),
    characteristic: (i32, i32),
    filter: [i32; 3],
    laser: bool,
    user_calibrated: bool,
    tracking: bool,
    pending: VecDeque<String>,
    scripted: VecDeque<String>,
    sent: Vec<String>,
}

impl MockLink {
    /// Port name that [`Link::open`] refuses, as if the device node were absent.
    pub const MISSING_PORT: &'static str = "/dev/missing";

    pub fn new(address: u8) -> Self {
        Self {
            port: "mock0".to_string(),
            address,
            distance: 12_345,
            temperature: 215,
            quality: 1_200,
            offset: 0,
            gain: (10_000, 10_000),
            characteristic: (0, 0),
            filter: [1, 0, 0],
            laser: false,
            user_calibrated: false,
            tracking: false,
            pending: VecDeque::new(),
            scripted: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Raw target distance in 0.1 mm, before the offset is applied.
    pub fn with_distance(mut self, tenths_mm: i32) -> Self {
        self.distance = tenths_mm;
        self
    }

    pub fn with_temperature(mut self, tenths_c: i32) -> Self {
        self.temperature = tenths_c;
        self
    }

    pub fn with_filter(mut self, average: i32, spikes: i32, errors: i32) -> Self {
        self.filter = [average, spikes, errors];
        self
    }

    /// Answer the next command with `line` instead of the simulated reply.
    pub fn script(&mut self, line: &str) {
        self.scripted.push_back(line.to_string());
    }

    /// Queue a line as if the sensor had sent it unprompted.
    pub fn inject(&mut self, line: &str) {
        self.pending.push_back(line.to_string());
    }

    /// Answer the next command with a sensor error.
    pub fn fail_next(&mut self, code: u16) {
        let line = Reply::Error(code).encode(self.address);
        self.script(&line);
    }

    /// Every line sent so far, without terminators.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_laser_on(&self) -> bool {
        self.laser
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_user_calibrated(&self) -> bool {
        self.user_calibrated
    }

    fn reading(&self) -> i32 {
        self.distance + self.offset
    }

    fn simulate(&mut self, cmd: Command) -> Option<Reply> {
        let reply = match cmd {
            Command::Measure => {
                self.laser = true;
                Reply::value(cmd.code(), &[self.reading()])
            }
            Command::Track { .. } => {
                self.laser = true;
                self.tracking = true;
                return None;
            }
            Command::Stop => {
                self.tracking = false;
                Reply::Ack
            }
            Command::LaserOn => {
                self.laser = true;
                Reply::Ack
            }
            Command::LaserOff => {
                self.laser = false;
                Reply::Ack
            }
            Command::Temperature => Reply::value(cmd.code(), &[self.temperature]),
            Command::SignalQuality => Reply::value(cmd.code(), &[self.quality]),
            Command::SetOffset(n) => {
                self.offset = n;
                Reply::Ack
            }
            Command::ReadOffset => Reply::value(cmd.code(), &[self.offset]),
            Command::SetGain {
                numerator,
                denominator,
            } => {
                if denominator == 0 {
                    Reply::Error(E_SYNTAX)
                } else {
                    self.gain = (numerator, denominator);
                    Reply::Ack
                }
            }
            Command::ReadGain => Reply::value(cmd.code(), &[self.gain.0, self.gain.1]),
            Command::SetCharacteristic { mode, sub_mode } => {
                if MeasuringCharacteristic::from_codes(mode, sub_mode).is_some() {
                    self.characteristic = (mode, sub_mode);
                    Reply::Ack
                } else {
                    Reply::Error(E_SYNTAX)
                }
            }
            Command::SetFilter {
                average,
                spikes,
                errors,
            } => {
                if [average, spikes, errors].iter().any(|v| *v < 0) {
                    Reply::Error(E_SYNTAX)
                } else {
                    self.filter = [average, spikes, errors];
                    Reply::Ack
                }
            }
            Command::ReadFilter => Reply::value(cmd.code(), &self.filter),
            Command::SetUserCalibrated(on) => {
                self.user_calibrated = on;
                Reply::Ack
            }
        };
        Some(reply)
    }
}

impl Link for MockLink {
    fn open(port: &str, config: &RangefinderConfig) -> Result<Self> {
        if port == Self::MISSING_PORT {
            return Err(RangefinderError::Open {
                port: port.to_string(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }
        let mut link = Self::new(config.address);
        link.port = port.to_string();
        Ok(link)
    }

    fn list() -> Result<Vec<PortInfo>> {
        Ok(vec![PortInfo {
            name: "mock0".to_string(),
            driver: "mock".to_string(),
        }])
    }

    fn port(&self) -> &str {
        &self.port
    }

    fn clear_input(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<()> {
        self.sent.push(line.to_string());
        if let Some(reply) = self.scripted.pop_front() {
            self.pending.push_back(reply);
            return Ok(());
        }
        match Command::decode(line) {
            Ok((address, _)) if address != self.address => {
                debug!(address, "mock: command for another module ignored");
            }
            Ok((_, cmd)) => {
                if let Some(reply) = self.simulate(cmd) {
                    self.pending.push_back(reply.encode(self.address));
                }
            }
            Err(_) => {
                self.pending
                    .push_back(Reply::Error(E_SYNTAX).encode(self.address));
            }
        }
        Ok(())
    }

    fn recv(&mut self, _timeout_ms: Option<u64>) -> Result<String> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(line);
        }
        if self.tracking {
            return Ok(Reply::value("h", &[self.reading()]).encode(self.address));
        }
        // nothing will ever arrive
        Err(RangefinderError::Timeout)
    }
}
