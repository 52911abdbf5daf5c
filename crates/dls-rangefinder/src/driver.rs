use core::fmt;
use core::str::FromStr;
use time::OffsetDateTime;
use tracing::{debug, info, trace, warn};

use crate::protocol::{GAIN_DENOMINATOR, MAX_FIELD};
use crate::{CancelToken, Command, Link, RangefinderConfig, RangefinderError, Reply, Result};

/// Passed to [`Rangefinder::set_output_filter`] to keep a dimension as is.
pub const FILTER_UNCHANGED: i32 = -1;

/// Tracking replies skipped while waiting for the stop acknowledge.
const MAX_STALE_SAMPLES: usize = 64;

/// Convert millimetres to the sensor's 0.1 mm fixed point.
///
/// Fails for non-finite input and for anything the 8-digit wire field
/// cannot carry.
pub fn mm_to_tenths(mm: f64) -> Result<i32> {
    let tenths = (mm * 10.0).round();
    if !tenths.is_finite() || tenths.abs() > f64::from(MAX_FIELD) {
        return Err(RangefinderError::OutOfRange(format!("{mm} mm")));
    }
    Ok(tenths as i32)
}

/// Measurement mode of the sensor, sent as a `(mode, sub_mode)` pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MeasuringCharacteristic {
    Normal,
    Fast,
    Precise,
    Natural,
    Timed,
    MovingWithError,
    MovingWithoutError,
}

impl MeasuringCharacteristic {
    pub const ALL: [MeasuringCharacteristic; 7] = [
        MeasuringCharacteristic::Normal,
        MeasuringCharacteristic::Fast,
        MeasuringCharacteristic::Precise,
        MeasuringCharacteristic::Natural,
        MeasuringCharacteristic::Timed,
        MeasuringCharacteristic::MovingWithError,
        MeasuringCharacteristic::MovingWithoutError,
    ];

    pub fn codes(self) -> (i32, i32) {
        match self {
            MeasuringCharacteristic::Normal => (0, 0),
            MeasuringCharacteristic::Fast => (0, 1),
            MeasuringCharacteristic::Precise => (0, 2),
            MeasuringCharacteristic::Natural => (0, 3),
            MeasuringCharacteristic::Timed => (1, 1),
            MeasuringCharacteristic::MovingWithError => (2, 0),
            MeasuringCharacteristic::MovingWithoutError => (2, 1),
        }
    }

    pub fn from_codes(mode: i32, sub_mode: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.codes() == (mode, sub_mode))
    }

    /// Name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            MeasuringCharacteristic::Normal => "normal",
            MeasuringCharacteristic::Fast => "fast",
            MeasuringCharacteristic::Precise => "precise",
            MeasuringCharacteristic::Natural => "natural",
            MeasuringCharacteristic::Timed => "timed",
            MeasuringCharacteristic::MovingWithError => "movingerror",
            MeasuringCharacteristic::MovingWithoutError => "movingnoerror",
        }
    }
}

impl fmt::Display for MeasuringCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasuringCharacteristic {
    type Err = RangefinderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RangefinderError::UnknownCharacteristic(s.to_string()))
    }
}

/// Output filter: samples averaged, spikes and errors rejected per output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OutputFilter {
    pub average: i32,
    pub spikes: i32,
    pub errors: i32,
}

impl OutputFilter {
    /// Overlay the dimensions that are not [`FILTER_UNCHANGED`].
    pub fn merge(self, average: i32, spikes: i32, errors: i32) -> Self {
        let pick = |new: i32, old: i32| if new == FILTER_UNCHANGED { old } else { new };
        Self {
            average: pick(average, self.average),
            spikes: pick(spikes, self.spikes),
            errors: pick(errors, self.errors),
        }
    }
}

/// One distance reading taken while tracking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Distance in 0.1 mm.
    pub distance: i32,
    pub at: OffsetDateTime,
}

impl Sample {
    pub fn millimetres(&self) -> f64 {
        f64::from(self.distance) / 10.0
    }
}

/// An open session with one sensor.
///
/// The session owns the link; dropping it releases the port and, if the
/// sensor is still tracking, sends a best-effort stop first.
pub struct Rangefinder<L: Link> {
    link: L,
    address: u8,
    read_timeout_ms: Option<u64>,
    tracking: bool,
    offset: Option<i32>,
    gain: Option<f64>,
    characteristic: Option<MeasuringCharacteristic>,
    output_filter: Option<OutputFilter>,
    user_calibrated: Option<bool>,
}

impl<L: Link> Rangefinder<L> {
    /// Open the port named in `config`.
    pub fn open(config: &RangefinderConfig) -> Result<Self> {
        let link = L::open(&config.port, config)?;
        info!(port = %config.port, baud = config.baud_rate, "rangefinder port open");
        Ok(Self::with_link(link, config))
    }

    /// Wrap an already open link.
    pub fn with_link(link: L, config: &RangefinderConfig) -> Self {
        Self {
            link,
            address: config.address,
            read_timeout_ms: config.read_timeout_ms,
            tracking: false,
            offset: None,
            gain: None,
            characteristic: None,
            output_filter: None,
            user_calibrated: None,
        }
    }

    /// Stop tracking if needed and release the port.
    pub fn close(mut self) -> Result<()> {
        if self.tracking {
            self.stop_tracking()?;
        }
        Ok(())
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn port(&self) -> &str {
        self.link.port()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Last offset written or read in this session, 0.1 mm.
    pub fn calibration_offset(&self) -> Option<i32> {
        self.offset
    }

    pub fn last_gain(&self) -> Option<f64> {
        self.gain
    }

    pub fn measuring_characteristic(&self) -> Option<MeasuringCharacteristic> {
        self.characteristic
    }

    pub fn cached_output_filter(&self) -> Option<OutputFilter> {
        self.output_filter
    }

    pub fn user_calibrated(&self) -> Option<bool> {
        self.user_calibrated
    }

    fn send(&mut self, cmd: Command) -> Result<()> {
        cmd.check_fields()?;
        let line = cmd.encode(self.address);
        trace!(port = %self.link.port(), tx = %line, "send");
        self.link.send(&line)
    }

    fn recv(&mut self) -> Result<Reply> {
        let line = self.link.recv(self.read_timeout_ms)?;
        trace!(port = %self.link.port(), rx = %line, "recv");
        let (address, reply) = Reply::parse(&line)?;
        if address != self.address {
            return Err(RangefinderError::InvalidResponse(format!(
                "reply from address {address}, expected {}",
                self.address
            )));
        }
        match reply {
            Reply::Error(code) => {
                warn!(port = %self.link.port(), code, "sensor error");
                Err(RangefinderError::Device { code })
            }
            other => Ok(other),
        }
    }

    fn transact(&mut self, cmd: Command) -> Result<Reply> {
        self.link.clear_input()?;
        self.send(cmd)?;
        self.recv()
    }

    fn expect_ack(&mut self, cmd: Command) -> Result<()> {
        match self.transact(cmd)? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(cmd, &other)),
        }
    }

    fn expect_values<const N: usize>(&mut self, cmd: Command) -> Result<[i32; N]> {
        let reply = self.transact(cmd)?;
        values_for(cmd, &reply)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.tracking {
            return Err(RangefinderError::TrackingActive);
        }
        Ok(())
    }

    /// Single-shot distance in 0.1 mm. Stops tracking first if active.
    pub fn measure_distance(&mut self) -> Result<i32> {
        if self.tracking {
            self.stop_tracking()?;
        }
        let [distance] = self.expect_values::<1>(Command::Measure)?;
        debug!(distance, "measured");
        Ok(distance)
    }

    pub fn start_tracking(&mut self) -> Result<()> {
        self.begin_tracking(None)
    }

    /// Track with `delay` × 10 ms between samples.
    pub fn start_tracking_delay(&mut self, delay: i32) -> Result<()> {
        self.begin_tracking(Some(delay))
    }

    fn begin_tracking(&mut self, delay: Option<i32>) -> Result<()> {
        self.ensure_idle()?;
        self.link.clear_input()?;
        self.send(Command::Track { delay })?;
        self.tracking = true;
        info!(port = %self.link.port(), ?delay, "tracking started");
        Ok(())
    }

    /// Next sample from an active tracking run, in 0.1 mm.
    ///
    /// Any failure ends the run: the session is left not tracking.
    pub fn read_tracking(&mut self) -> Result<i32> {
        if !self.tracking {
            return Err(RangefinderError::NotTracking);
        }
        let cmd = Command::Track { delay: None };
        match self.recv().and_then(|reply| values_for::<1>(cmd, &reply)) {
            Ok([distance]) => Ok(distance),
            Err(e) => {
                warn!(port = %self.link.port(), error = %e, "tracking aborted");
                self.tracking = false;
                let _ = self.send(Command::Stop);
                Err(e)
            }
        }
    }

    /// Stop continuous measurement. Safe to call when not tracking.
    pub fn stop_tracking(&mut self) -> Result<()> {
        let was_tracking = self.tracking;
        self.tracking = false;
        self.link.clear_input()?;
        self.send(Command::Stop)?;
        // samples already in flight may precede the acknowledge
        for _ in 0..MAX_STALE_SAMPLES {
            match self.recv()? {
                Reply::Ack => {
                    if was_tracking {
                        info!(port = %self.link.port(), "tracking stopped");
                    }
                    return Ok(());
                }
                Reply::Values { ref code, .. } if code == "h" => continue,
                other => return Err(unexpected(Command::Stop, &other)),
            }
        }
        Err(RangefinderError::InvalidResponse(
            "no acknowledge after stop".to_string(),
        ))
    }

    /// Run the tracking loop until `cancel` is set, passing every sample to
    /// `on_sample`. Tracking must already be started; it is always stopped
    /// when this returns. Returns the number of samples delivered.
    pub fn track<F>(&mut self, cancel: &CancelToken, mut on_sample: F) -> Result<u64>
    where
        F: FnMut(Sample),
    {
        if !self.tracking {
            return Err(RangefinderError::NotTracking);
        }
        let mut count = 0u64;
        while !cancel.is_cancelled() {
            let distance = self.read_tracking()?;
            on_sample(Sample {
                distance,
                at: OffsetDateTime::now_utc(),
            });
            count += 1;
        }
        self.stop_tracking()?;
        debug!(samples = count, "tracking loop cancelled");
        Ok(count)
    }

    pub fn laser_on(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.expect_ack(Command::LaserOn)?;
        info!(port = %self.link.port(), "laser on");
        Ok(())
    }

    pub fn laser_off(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.expect_ack(Command::LaserOff)?;
        info!(port = %self.link.port(), "laser off");
        Ok(())
    }

    /// Sensor temperature in 0.1 °C.
    pub fn read_temperature(&mut self) -> Result<i32> {
        self.ensure_idle()?;
        let [t] = self.expect_values::<1>(Command::Temperature)?;
        Ok(t)
    }

    pub fn signal_quality(&mut self) -> Result<i32> {
        self.ensure_idle()?;
        let [q] = self.expect_values::<1>(Command::SignalQuality)?;
        Ok(q)
    }

    /// Persist a distance offset, 0.1 mm.
    pub fn set_offset(&mut self, tenths_mm: i32) -> Result<()> {
        self.ensure_idle()?;
        self.expect_ack(Command::SetOffset(tenths_mm))?;
        self.offset = Some(tenths_mm);
        info!(offset = tenths_mm, "offset set");
        Ok(())
    }

    /// Read the stored offset back from the sensor, 0.1 mm.
    pub fn offset(&mut self) -> Result<i32> {
        self.ensure_idle()?;
        let [offset] = self.expect_values::<1>(Command::ReadOffset)?;
        self.offset = Some(offset);
        Ok(offset)
    }

    /// Persist a gain factor, sent as a ratio over 10000.
    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        self.ensure_idle()?;
        let scaled = (gain * f64::from(GAIN_DENOMINATOR)).round();
        if !scaled.is_finite() || scaled.abs() > f64::from(MAX_FIELD) {
            return Err(RangefinderError::OutOfRange(format!("gain {gain}")));
        }
        self.expect_ack(Command::SetGain {
            numerator: scaled as i32,
            denominator: GAIN_DENOMINATOR,
        })?;
        self.gain = Some(gain);
        info!(gain, "gain set");
        Ok(())
    }

    pub fn gain(&mut self) -> Result<f64> {
        self.ensure_idle()?;
        let [numerator, denominator] = self.expect_values::<2>(Command::ReadGain)?;
        if denominator == 0 {
            return Err(RangefinderError::InvalidResponse(
                "gain denominator is zero".to_string(),
            ));
        }
        let gain = f64::from(numerator) / f64::from(denominator);
        self.gain = Some(gain);
        Ok(gain)
    }

    pub fn set_measuring_characteristic(&mut self, mc: MeasuringCharacteristic) -> Result<()> {
        self.ensure_idle()?;
        let (mode, sub_mode) = mc.codes();
        self.expect_ack(Command::SetCharacteristic { mode, sub_mode })?;
        self.characteristic = Some(mc);
        info!(characteristic = %mc, mode, sub_mode, "measuring characteristic set");
        Ok(())
    }

    /// Update the output filter. [`FILTER_UNCHANGED`] keeps a dimension as
    /// it is; when not known from this session it is read from the sensor.
    pub fn set_output_filter(&mut self, average: i32, spikes: i32, errors: i32) -> Result<()> {
        self.ensure_idle()?;
        let all = [average, spikes, errors];
        if all.iter().all(|&v| v == FILTER_UNCHANGED) {
            return Ok(());
        }
        let current = if all.iter().any(|&v| v == FILTER_UNCHANGED) {
            match self.output_filter {
                Some(f) => f,
                None => self.output_filter()?,
            }
        } else {
            OutputFilter::default()
        };
        let next = current.merge(average, spikes, errors);
        self.expect_ack(Command::SetFilter {
            average: next.average,
            spikes: next.spikes,
            errors: next.errors,
        })?;
        self.output_filter = Some(next);
        info!(
            average = next.average,
            spikes = next.spikes,
            errors = next.errors,
            "output filter set"
        );
        Ok(())
    }

    /// Read the output filter from the sensor.
    pub fn output_filter(&mut self) -> Result<OutputFilter> {
        self.ensure_idle()?;
        let [average, spikes, errors] = self.expect_values::<3>(Command::ReadFilter)?;
        let filter = OutputFilter {
            average,
            spikes,
            errors,
        };
        self.output_filter = Some(filter);
        Ok(filter)
    }

    pub fn set_user_calibrated(&mut self, on: bool) -> Result<()> {
        self.ensure_idle()?;
        self.expect_ack(Command::SetUserCalibrated(on))?;
        self.user_calibrated = Some(on);
        info!(user_calibrated = on, "calibration source set");
        Ok(())
    }
}

impl<L: Link> Drop for Rangefinder<L> {
    fn drop(&mut self) {
        if self.tracking {
            debug!(port = %self.link.port(), "stopping tracking on close");
            let _ = self.send(Command::Stop);
        }
    }
}

fn unexpected(cmd: Command, reply: &Reply) -> RangefinderError {
    RangefinderError::InvalidResponse(format!("{reply:?} in answer to {cmd:?}"))
}

fn values_for<const N: usize>(cmd: Command, reply: &Reply) -> Result<[i32; N]> {
    match reply {
        Reply::Values { code, values } if code == cmd.code() => values
            .as_slice()
            .try_into()
            .map_err(|_| unexpected(cmd, reply)),
        other => Err(unexpected(cmd, other)),
    }
}
