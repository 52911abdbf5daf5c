use anyhow::{bail, Context, Result};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::thread;
use tracing::{info, warn};

use dls_rangefinder as dls;
use dls_rangefinder::{
    CancelToken, Link, MeasuringCharacteristic, Rangefinder, RangefinderConfig, FILTER_UNCHANGED,
};

/// Options run in the order given; repeat them freely.
#[derive(Parser, Debug)]
#[command(
    name = "dls",
    version,
    about = "DLS laser rangefinder tool",
    disable_help_flag = true
)]
struct Cli {
    /// Serial device of the sensor; reopens if it differs from the current one
    #[arg(short = 'p', long, value_name = "DEV", action = ArgAction::Append)]
    port: Vec<String>,
    /// Switch the sensor to its user calibration
    #[arg(short = 'u', long, num_args = 0, default_missing_value = "true", action = ArgAction::Append)]
    user: Vec<bool>,
    /// Single measurement, printed in mm
    #[arg(short = 'm', long, num_args = 0, default_missing_value = "true", action = ArgAction::Append)]
    measure: Vec<bool>,
    /// Measure continuously until Enter is pressed, optionally DELAY_MS apart (-c250, -c=250 or -c 250)
    #[arg(short = 'c', long, value_name = "DELAY_MS", num_args = 0..=1, default_missing_value = "", value_parser = parse_delay, action = ArgAction::Append)]
    continuous: Vec<Delay>,
    /// Laser on|off
    #[arg(short = 'l', long, value_name = "on|off", action = ArgAction::Append)]
    laser: Vec<String>,
    /// Sensor temperature, printed in C
    #[arg(short = 't', long, num_args = 0, default_missing_value = "true", action = ArgAction::Append)]
    temp: Vec<bool>,
    /// Distance offset in mm
    #[arg(short = 'o', long, value_name = "MM", allow_negative_numbers = true, action = ArgAction::Append)]
    offset: Vec<f64>,
    /// Measuring characteristic: normal, fast, precise, natural, timed, movingerror, movingnoerror
    #[arg(short = 's', long, value_name = "MODE", action = ArgAction::Append)]
    speed: Vec<String>,
    /// Gain factor
    #[arg(short = 'g', long, allow_negative_numbers = true, action = ArgAction::Append)]
    gain: Vec<f64>,
    /// Signal quality
    #[arg(short = 'q', long, num_args = 0, default_missing_value = "true", action = ArgAction::Append)]
    quality: Vec<bool>,
    /// Output filter: samples averaged per output
    #[arg(short = 'a', long, value_name = "N", action = ArgAction::Append)]
    average: Vec<i32>,
    /// Output filter: spikes rejected per output
    #[arg(short = 'n', long, value_name = "N", action = ArgAction::Append)]
    nspikes: Vec<i32>,
    /// Output filter: errors tolerated per output
    #[arg(short = 'e', long, value_name = "N", action = ArgAction::Append)]
    errors: Vec<i32>,
    /// Print help
    #[arg(short = 'h', long, num_args = 0, default_missing_value = "true", action = ArgAction::Append)]
    help: Vec<bool>,

    /// Connection settings (YAML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Use the simulated sensor instead of a serial port
    #[arg(long, action = ArgAction::SetTrue)]
    mock: bool,
    /// List serial ports
    #[arg(long, action = ArgAction::SetTrue)]
    list: bool,
}

/// Optional `-c` argument; `None` means no pause between samples.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Delay(Option<u64>);

fn parse_delay(s: &str) -> Result<Delay, String> {
    if s.is_empty() {
        return Ok(Delay(None));
    }
    s.parse()
        .map(|ms| Delay(Some(ms)))
        .map_err(|e| format!("invalid delay {s:?}: {e}"))
}

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Port(String),
    User,
    Measure,
    Continuous(Option<u64>),
    Laser(String),
    Temperature,
    Offset(f64),
    Speed(String),
    Gain(f64),
    Quality,
    Average(i32),
    Spikes(i32),
    Errors(i32),
    Help,
}

fn parse_args<I, T>(args: I) -> Result<(Cli, Vec<Action>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    let actions = ordered_actions(&cli, &matches);
    Ok((cli, actions))
}

/// Flatten all device options into one list in command-line order.
fn ordered_actions(cli: &Cli, matches: &ArgMatches) -> Vec<Action> {
    let mut indexed: Vec<(usize, Action)> = Vec::new();
    let mut push = |id: &str, actions: Vec<Action>| {
        if let Some(indices) = matches.indices_of(id) {
            indexed.extend(indices.zip(actions));
        }
    };
    push("port", cli.port.iter().cloned().map(Action::Port).collect());
    push("user", cli.user.iter().map(|_| Action::User).collect());
    push("measure", cli.measure.iter().map(|_| Action::Measure).collect());
    push(
        "continuous",
        cli.continuous
            .iter()
            .map(|d| Action::Continuous(d.0))
            .collect(),
    );
    push("laser", cli.laser.iter().cloned().map(Action::Laser).collect());
    push("temp", cli.temp.iter().map(|_| Action::Temperature).collect());
    push("offset", cli.offset.iter().copied().map(Action::Offset).collect());
    push("speed", cli.speed.iter().cloned().map(Action::Speed).collect());
    push("gain", cli.gain.iter().copied().map(Action::Gain).collect());
    push("quality", cli.quality.iter().map(|_| Action::Quality).collect());
    push("average", cli.average.iter().copied().map(Action::Average).collect());
    push("nspikes", cli.nspikes.iter().copied().map(Action::Spikes).collect());
    push("errors", cli.errors.iter().copied().map(Action::Errors).collect());
    push("help", cli.help.iter().map(|_| Action::Help).collect());
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, a)| a).collect()
}

/// Executes actions against one sensor session, writing results to `out`.
struct Runner<L: Link, W: Write> {
    config: RangefinderConfig,
    device: Option<Rangefinder<L>>,
    out: W,
    usage: String,
    key_press: Box<dyn Fn() -> CancelToken>,
    errors: Vec<String>,
}

impl<L: Link, W: Write> Runner<L, W> {
    fn new(config: RangefinderConfig, out: W, key_press: Box<dyn Fn() -> CancelToken>) -> Self {
        Self {
            config,
            device: None,
            out,
            usage: Cli::command().render_help().to_string(),
            key_press,
            errors: Vec::new(),
        }
    }

    /// Run every action; a failing action is reported and the rest still run.
    /// Returns the number of failures.
    fn run(&mut self, actions: &[Action]) -> usize {
        let mut failures = 0;
        for action in actions {
            if let Err(e) = self.apply(action) {
                let msg = format!("{e:#}");
                eprintln!("error: {msg}");
                self.errors.push(msg);
                failures += 1;
            }
        }
        failures
    }

    fn open(&mut self) -> Result<(&mut Rangefinder<L>, &mut W)> {
        if self.device.is_none() {
            let rf = Rangefinder::open(&self.config)?;
            self.device = Some(rf);
        }
        let rf = self.device.as_mut().context("no port open")?;
        Ok((rf, &mut self.out))
    }

    fn device(&mut self) -> Result<&mut Rangefinder<L>> {
        self.open().map(|(rf, _)| rf)
    }

    /// Switch to `port`. If it cannot be opened the current session and
    /// port are kept.
    fn reopen(&mut self, port: &str) -> Result<()> {
        if self.device.is_some() && self.config.port == port {
            return Ok(());
        }
        let config = self.config.with_port(port);
        let rf = Rangefinder::open(&config)?;
        if let Some(old) = self.device.replace(rf) {
            let from = old.port().to_string();
            if let Err(e) = old.close() {
                warn!(port = %from, error = %e, "could not stop tracking before switching port");
            }
        }
        self.config = config;
        self.device()?.stop_tracking()?;
        info!(port, "switched port");
        Ok(())
    }

    fn apply(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Port(port) => self.reopen(port)?,
            Action::User => self.device()?.set_user_calibrated(true)?,
            Action::Measure => {
                let (rf, out) = self.open()?;
                let distance = rf.measure_distance()?;
                writeln!(out, "{:.1} mm", f64::from(distance) / 10.0)?;
            }
            Action::Continuous(delay_ms) => self.continuous(*delay_ms)?,
            Action::Laser(state) => match state.as_str() {
                "on" => self.device()?.laser_on()?,
                "off" => self.device()?.laser_off()?,
                other => bail!("laser state must be 'on' or 'off', got {other:?}"),
            },
            Action::Temperature => {
                let (rf, out) = self.open()?;
                let t = rf.read_temperature()?;
                writeln!(out, "{:.1} C", f64::from(t) / 10.0)?;
            }
            Action::Offset(mm) => {
                let tenths = dls::mm_to_tenths(*mm)?;
                self.device()?.set_offset(tenths)?
            }
            Action::Speed(name) => {
                let mc: MeasuringCharacteristic = name.parse()?;
                self.device()?.set_measuring_characteristic(mc)?;
            }
            Action::Gain(gain) => self.device()?.set_gain(*gain)?,
            Action::Quality => {
                let (rf, out) = self.open()?;
                let q = rf.signal_quality()?;
                writeln!(out, "{q}")?;
            }
            Action::Average(n) => {
                self.device()?
                    .set_output_filter(*n, FILTER_UNCHANGED, FILTER_UNCHANGED)?
            }
            Action::Spikes(n) => {
                self.device()?
                    .set_output_filter(FILTER_UNCHANGED, *n, FILTER_UNCHANGED)?
            }
            Action::Errors(n) => {
                self.device()?
                    .set_output_filter(FILTER_UNCHANGED, FILTER_UNCHANGED, *n)?
            }
            Action::Help => write!(self.out, "{}", self.usage)?,
        }
        Ok(())
    }

    fn continuous(&mut self, delay_ms: Option<u64>) -> Result<()> {
        let delay = delay_ms
            .map(|ms| i32::try_from(ms / 10).with_context(|| format!("delay {ms} ms too long")))
            .transpose()?;
        let rf = self.device()?;
        rf.stop_tracking()?;
        match delay {
            Some(ticks) => rf.start_tracking_delay(ticks)?,
            None => rf.start_tracking()?,
        }
        let cancel = (self.key_press)();
        let (rf, out) = self.open()?;
        let mut write_err = None;
        rf.track(&cancel, |sample| {
            if let Err(e) = writeln!(out, "{:.1} mm", sample.millimetres()) {
                write_err.get_or_insert(e);
                cancel.cancel();
            }
        })?;
        match write_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Token of the running `-c`, cancelled by the next line on stdin.
static ARMED: Mutex<Option<CancelToken>> = Mutex::new(None);
static STDIN_CLOSED: AtomicBool = AtomicBool::new(false);
static STDIN_READER: Once = Once::new();

fn armed() -> std::sync::MutexGuard<'static, Option<CancelToken>> {
    ARMED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Token cancelled when Enter is pressed. A single reader thread serves
/// every call; once stdin is closed tokens come back already cancelled.
fn key_press() -> CancelToken {
    let token = CancelToken::new();
    *armed() = Some(token.clone());
    STDIN_READER.call_once(|| {
        thread::spawn(|| {
            let mut line = String::new();
            loop {
                line.clear();
                let closed = matches!(io::stdin().lock().read_line(&mut line), Ok(0) | Err(_));
                if closed {
                    STDIN_CLOSED.store(true, Ordering::SeqCst);
                }
                if let Some(token) = armed().take() {
                    token.cancel();
                }
                if closed {
                    break;
                }
            }
        });
    });
    if STDIN_CLOSED.load(Ordering::SeqCst) {
        token.cancel();
    } else {
        eprintln!("press Enter to stop");
    }
    token
}

fn list_ports<L: Link>() -> Result<()> {
    for port in L::list()? {
        println!("{}\t{}", port.name, port.driver);
    }
    Ok(())
}

fn run<L: Link>(cli: &Cli, config: RangefinderConfig, actions: &[Action]) -> Result<()> {
    if cli.list {
        list_ports::<L>()?;
    }
    let mut runner: Runner<L, _> = Runner::new(config, io::stdout().lock(), Box::new(key_press));
    let failures = runner.run(actions);
    if failures > 0 {
        warn!(failures, "some options failed");
    }
    Ok(())
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    setup_tracing();
    let (cli, actions) = match parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            // usage errors still exit 0
            let _ = e.print();
            return;
        }
    };
    if actions.is_empty() && !cli.list {
        print!("{}", Cli::command().render_help());
        return;
    }
    let config = match &cli.config {
        Some(path) => match dls::load_config_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("error: {e:#}");
                return;
            }
        },
        None => RangefinderConfig::default(),
    };
    let result = if cli.mock {
        run::<dls::MockLink>(&cli, config, &actions)
    } else {
        run::<dls::SerialLink>(&cli, config, &actions)
    };
    if let Err(e) = result {
        eprintln!("error: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dls_rangefinder::MockLink;

    fn actions(args: &[&str]) -> Vec<Action> {
        let mut argv = vec!["dls"];
        argv.extend_from_slice(args);
        parse_args(argv).unwrap().1
    }

    fn runner(cancel: CancelToken) -> Runner<MockLink, Vec<u8>> {
        Runner::new(
            RangefinderConfig::default(),
            Vec::new(),
            Box::new(move || cancel.clone()),
        )
    }

    fn output(r: &Runner<MockLink, Vec<u8>>) -> String {
        String::from_utf8(r.out.clone()).unwrap()
    }

    fn sent(r: &Runner<MockLink, Vec<u8>>) -> Vec<String> {
        r.device
            .as_ref()
            .map(|d| d.link().sent().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn options_keep_command_line_order() {
        assert_eq!(
            actions(&["-s", "precise", "-m", "-o", "12.5", "-c=250", "-c", "-a", "5", "-m"]),
            vec![
                Action::Speed("precise".into()),
                Action::Measure,
                Action::Offset(12.5),
                Action::Continuous(Some(250)),
                Action::Continuous(None),
                Action::Average(5),
                Action::Measure,
            ]
        );
    }

    #[test]
    fn long_forms_parse() {
        assert_eq!(
            actions(&["--port", "/dev/ttyS1", "--laser", "on", "--continuous=40", "--temp"]),
            vec![
                Action::Port("/dev/ttyS1".into()),
                Action::Laser("on".into()),
                Action::Continuous(Some(40)),
                Action::Temperature,
            ]
        );
        assert_eq!(actions(&["-o", "-2.5"]), vec![Action::Offset(-2.5)]);
    }

    #[test]
    fn usage_errors_are_rejected_before_running() {
        let argv = |a: &[&'static str]| [&["dls"][..], a].concat();
        assert!(parse_args(argv(&["-x"])).is_err());
        assert!(parse_args(argv(&["-o"])).is_err());
        assert!(parse_args(argv(&["-a", "many"])).is_err());
        assert!(parse_args(argv(&["-c=soon"])).is_err());
    }

    #[test]
    fn measure_prints_millimetres() {
        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&["-p", "/dev/ttyUSB0", "-m"]));
        assert_eq!(failures, 0);
        assert_eq!(output(&r), "1234.5 mm\n");
        assert_eq!(sent(&r), ["s0c", "s0g"]);
    }

    #[test]
    fn speed_sets_characteristic_only() {
        let mut r = runner(CancelToken::new());
        assert_eq!(r.run(&actions(&["-s", "precise"])), 0);
        assert_eq!(sent(&r), ["s0uc+00000000+00000002"]);
        assert!(output(&r).is_empty());
    }

    #[test]
    fn bad_values_fail_alone() {
        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&["-s", "turbo", "-l", "dim", "-t"]));
        assert_eq!(failures, 2);
        assert_eq!(output(&r), "21.5 C\n");
    }

    #[test]
    fn offset_gain_and_filters() {
        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&["-o", "12.5", "-g", "1.5", "-n", "2", "-u"]));
        assert_eq!(failures, 0);
        assert_eq!(
            sent(&r),
            [
                "s0uof+00000125",
                "s0uga+00015000+00010000",
                "s0fi",
                "s0fi+00000001+00000002+00000000",
                "s0uu+00000001",
            ]
        );
    }

    #[test]
    fn continuous_stops_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut r = runner(cancel);
        assert_eq!(r.run(&actions(&["-c=250", "-q"])), 0);
        assert_eq!(
            sent(&r),
            ["s0c", "s0h+00000025", "s0c", "s0m+00000000"]
        );
        assert_eq!(output(&r), "1200\n");
        assert!(!r.device.as_ref().unwrap().is_tracking());
    }

    #[test]
    fn same_port_is_not_reopened() {
        let mut r = runner(CancelToken::new());
        r.run(&actions(&["-p", "/dev/ttyS0", "-m", "-p", "/dev/ttyS0"]));
        assert_eq!(sent(&r), ["s0c", "s0g"]);
        r.run(&actions(&["-p", "/dev/ttyS9"]));
        assert_eq!(r.device.as_ref().unwrap().port(), "/dev/ttyS9");
        assert_eq!(sent(&r), ["s0c"]);
    }

    #[test]
    fn help_prints_usage() {
        let mut r = runner(CancelToken::new());
        r.run(&[Action::Help]);
        assert!(output(&r).contains("--continuous"));
        assert!(r.device.is_none());
    }

    #[test]
    fn switches_take_no_values() {
        let argv = |a: &[&'static str]| [&["dls"][..], a].concat();
        for bad in ["-m=false", "--measure=false", "-t=1", "-u=true", "--quality=no"] {
            assert!(parse_args(argv(&[bad])).is_err(), "{bad}");
        }
        assert_eq!(
            actions(&["-mt", "-q", "-u"]),
            vec![
                Action::Measure,
                Action::Temperature,
                Action::Quality,
                Action::User
            ]
        );
    }

    #[test]
    fn continuous_delay_forms() {
        assert_eq!(actions(&["-c250"]), vec![Action::Continuous(Some(250))]);
        assert_eq!(actions(&["-c=250"]), vec![Action::Continuous(Some(250))]);
        assert_eq!(actions(&["-c", "250"]), vec![Action::Continuous(Some(250))]);
        assert_eq!(
            actions(&["-c", "-m", "-c"]),
            vec![
                Action::Continuous(None),
                Action::Measure,
                Action::Continuous(None)
            ]
        );
    }

    #[test]
    fn failed_port_open_keeps_the_current_session() {
        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&["-p", MockLink::MISSING_PORT, "-s", "precise"]));
        assert_eq!(failures, 1);
        let msg = &r.errors[0];
        assert!(msg.contains(MockLink::MISSING_PORT), "{msg}");
        assert!(
            msg.contains(&io::Error::from(io::ErrorKind::NotFound).to_string()),
            "{msg}"
        );
        assert_eq!(sent(&r), ["s0uc+00000000+00000002"]);
        assert_eq!(
            r.device.as_ref().unwrap().port(),
            RangefinderConfig::default().port
        );

        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&[
            "-p",
            "/dev/ttyS1",
            "-m",
            "-p",
            MockLink::MISSING_PORT,
            "-m",
        ]));
        assert_eq!(failures, 1);
        assert_eq!(r.device.as_ref().unwrap().port(), "/dev/ttyS1");
        assert_eq!(sent(&r), ["s0c", "s0g", "s0g"]);
        assert_eq!(output(&r), "1234.5 mm\n1234.5 mm\n");
    }

    #[test]
    fn enter_key_is_only_watched_once_tracking_runs() {
        use std::cell::Cell;
        use std::rc::Rc;

        let armed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&armed);
        let mut r: Runner<MockLink, Vec<u8>> = Runner::new(
            RangefinderConfig::default().with_port(MockLink::MISSING_PORT),
            Vec::new(),
            Box::new(move || {
                counter.set(counter.get() + 1);
                let token = CancelToken::new();
                token.cancel();
                token
            }),
        );
        assert_eq!(r.run(&actions(&["-c", "-c=10"])), 2);
        assert_eq!(armed.get(), 0);

        assert_eq!(r.run(&actions(&["-p", "/dev/ttyS2", "-c=2000000000", "-c"])), 1);
        assert_eq!(armed.get(), 1);
        assert!(r.errors.last().unwrap().contains("out of range"));
        assert!(!r.device.as_ref().unwrap().is_tracking());
    }

    #[test]
    fn values_the_sensor_cannot_carry_fail_alone() {
        let mut r = runner(CancelToken::new());
        let failures = r.run(&actions(&[
            "-o",
            "nan",
            "-o",
            "1e12",
            "-g",
            "nan",
            "-c=9999999999999",
            "-a",
            "2000000000",
            "-m",
        ]));
        assert_eq!(failures, 5);
        assert_eq!(sent(&r), ["s0fi", "s0g"]);
        assert_eq!(output(&r), "1234.5 mm\n");
        assert!(
            r.errors.iter().all(|e| !e.starts_with("invalid response")),
            "{:?}",
            r.errors
        );
    }
}
