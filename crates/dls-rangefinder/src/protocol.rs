//! ASCII wire codec.
//!
//! Commands are `s<addr><code>[+arg...]`, replies are `g<addr><code>+value...`,
//! `g<addr>?` for a bare acknowledge or `g<addr>@Ennn` for a sensor error.
//! Every numeric field carries its sign and is zero padded to 8 digits.
//! Line terminators are the link's concern.

use crate::{RangefinderError, Result};

/// Denominator used when the gain is sent as a ratio.
pub const GAIN_DENOMINATOR: i32 = 10_000;

/// Largest magnitude a signed 8-digit field can carry.
pub const MAX_FIELD: i32 = 99_999_999;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Measure,
    /// Continuous measurement; `delay` is the pause between samples in 10 ms units.
    Track { delay: Option<i32> },
    Stop,
    LaserOn,
    LaserOff,
    Temperature,
    SignalQuality,
    SetOffset(i32),
    ReadOffset,
    SetGain { numerator: i32, denominator: i32 },
    ReadGain,
    SetCharacteristic { mode: i32, sub_mode: i32 },
    SetFilter { average: i32, spikes: i32, errors: i32 },
    ReadFilter,
    SetUserCalibrated(bool),
}

impl Command {
    /// Command letters; a value reply to this command echoes them.
    pub fn code(&self) -> &'static str {
        match self {
            Command::Measure => "g",
            Command::Track { .. } => "h",
            Command::Stop => "c",
            Command::LaserOn => "o",
            Command::LaserOff => "p",
            Command::Temperature => "t",
            Command::SignalQuality => "m",
            Command::SetOffset(_) | Command::ReadOffset => "uof",
            Command::SetGain { .. } | Command::ReadGain => "uga",
            Command::SetCharacteristic { .. } => "uc",
            Command::SetFilter { .. } | Command::ReadFilter => "fi",
            Command::SetUserCalibrated(_) => "uu",
        }
    }

    fn args(&self) -> Vec<i32> {
        match *self {
            Command::Track { delay: Some(d) } => vec![d],
            Command::SignalQuality => vec![0],
            Command::SetOffset(n) => vec![n],
            Command::SetGain {
                numerator,
                denominator,
            } => vec![numerator, denominator],
            Command::SetCharacteristic { mode, sub_mode } => vec![mode, sub_mode],
            Command::SetFilter {
                average,
                spikes,
                errors,
            } => vec![average, spikes, errors],
            Command::SetUserCalibrated(on) => vec![i32::from(on)],
            _ => Vec::new(),
        }
    }

    /// Fails if an argument does not fit the 8-digit field width.
    pub fn check_fields(&self) -> Result<()> {
        match self
            .args()
            .into_iter()
            .find(|v| !(-MAX_FIELD..=MAX_FIELD).contains(v))
        {
            Some(v) => Err(RangefinderError::OutOfRange(format!(
                "{v} does not fit an 8-digit field of {:?}",
                self.code()
            ))),
            None => Ok(()),
        }
    }

    pub fn encode(&self, address: u8) -> String {
        let mut out = format!("s{address}{}", self.code());
        push_fields(&mut out, &self.args());
        out
    }

    /// Parse a command line as the sensor would; returns the target address.
    pub fn decode(line: &str) -> Result<(u8, Command)> {
        let body = trim(line)
            .strip_prefix('s')
            .ok_or_else(|| invalid("command must start with 's'", line))?;
        let (address, rest) = split_address(body).ok_or_else(|| invalid("address", line))?;
        let (code, fields) = split_code(rest);
        let args = parse_fields(fields).ok_or_else(|| invalid("fields", line))?;
        let cmd = match (code, args.as_slice()) {
            ("g", []) => Command::Measure,
            ("h", []) => Command::Track { delay: None },
            ("h", [d]) => Command::Track { delay: Some(*d) },
            ("c", []) => Command::Stop,
            ("o", []) => Command::LaserOn,
            ("p", []) => Command::LaserOff,
            ("t", []) => Command::Temperature,
            ("m", [0]) => Command::SignalQuality,
            ("uof", []) => Command::ReadOffset,
            ("uof", [n]) => Command::SetOffset(*n),
            ("uga", []) => Command::ReadGain,
            ("uga", [n, d]) => Command::SetGain {
                numerator: *n,
                denominator: *d,
            },
            ("uc", [m, s]) => Command::SetCharacteristic {
                mode: *m,
                sub_mode: *s,
            },
            ("fi", []) => Command::ReadFilter,
            ("fi", [a, s, e]) => Command::SetFilter {
                average: *a,
                spikes: *s,
                errors: *e,
            },
            ("uu", [1]) => Command::SetUserCalibrated(true),
            ("uu", [0]) => Command::SetUserCalibrated(false),
            _ => return Err(invalid("unknown command", line)),
        };
        Ok((address, cmd))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reply {
    Ack,
    Values { code: String, values: Vec<i32> },
    Error(u16),
}

impl Reply {
    pub fn value(code: &str, values: &[i32]) -> Self {
        Reply::Values {
            code: code.to_string(),
            values: values.to_vec(),
        }
    }

    pub fn encode(&self, address: u8) -> String {
        match self {
            Reply::Ack => format!("g{address}?"),
            Reply::Error(code) => format!("g{address}@E{code:03}"),
            Reply::Values { code, values } => {
                let mut out = format!("g{address}{code}");
                push_fields(&mut out, values);
                out
            }
        }
    }

    /// Parse one reply line; returns the sender address.
    pub fn parse(line: &str) -> Result<(u8, Reply)> {
        let body = trim(line)
            .strip_prefix('g')
            .ok_or_else(|| invalid("reply must start with 'g'", line))?;
        let (address, rest) = split_address(body).ok_or_else(|| invalid("address", line))?;
        if rest == "?" {
            return Ok((address, Reply::Ack));
        }
        if let Some(code) = rest.strip_prefix("@E") {
            let code = code.parse().map_err(|_| invalid("error code", line))?;
            return Ok((address, Reply::Error(code)));
        }
        let (code, fields) = split_code(rest);
        if code.is_empty() {
            return Err(invalid("missing command code", line));
        }
        let values = parse_fields(fields).ok_or_else(|| invalid("fields", line))?;
        Ok((
            address,
            Reply::Values {
                code: code.to_string(),
                values,
            },
        ))
    }
}

fn invalid(what: &str, line: &str) -> RangefinderError {
    RangefinderError::InvalidResponse(format!("{what}: {:?}", trim(line)))
}

fn trim(line: &str) -> &str {
    line.trim_end_matches(&['\r', '\n'][..])
}

fn push_fields(out: &mut String, values: &[i32]) {
    for v in values {
        out.push_str(&format!("{v:+09}"));
    }
}

fn split_address(s: &str) -> Option<(u8, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let address = s[..end].parse().ok()?;
    Some((address, &s[end..]))
}

fn split_code(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn parse_fields(mut s: &str) -> Option<Vec<i32>> {
    let mut out = Vec::new();
    while !s.is_empty() {
        let negative = match s.as_bytes()[0] {
            b'+' => false,
            b'-' => true,
            _ => return None,
        };
        let digits = &s[1..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        let magnitude: i64 = digits[..end].parse().ok()?;
        let value = if negative { -magnitude } else { magnitude };
        out.push(i32::try_from(value).ok()?);
        s = &digits[end..];
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_padded_signed_fields() {
        assert_eq!(Command::Measure.encode(0), "s0g");
        assert_eq!(Command::SetOffset(125).encode(0), "s0uof+00000125");
        assert_eq!(
            Command::SetFilter {
                average: 5,
                spikes: -1,
                errors: 0
            }
            .encode(3),
            "s3fi+00000005-00000001+00000000"
        );
        assert_eq!(
            Command::Track { delay: Some(25) }.encode(0),
            "s0h+00000025"
        );
        assert_eq!(Command::SignalQuality.encode(0), "s0m+00000000");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let cmds = [
            Command::Track { delay: None },
            Command::SetGain {
                numerator: 10_250,
                denominator: GAIN_DENOMINATOR,
            },
            Command::SetCharacteristic {
                mode: 2,
                sub_mode: 1,
            },
            Command::SetUserCalibrated(true),
            Command::ReadFilter,
        ];
        for cmd in cmds {
            assert_eq!(Command::decode(&cmd.encode(12)).unwrap(), (12, cmd));
        }
    }

    #[test]
    fn parses_replies() {
        assert_eq!(Reply::parse("g0?\r\n").unwrap(), (0, Reply::Ack));
        assert_eq!(Reply::parse("g0@E212").unwrap(), (0, Reply::Error(212)));
        assert_eq!(
            Reply::parse("g0t-00000052").unwrap(),
            (0, Reply::value("t", &[-52]))
        );
        assert_eq!(
            Reply::parse("g1uga+00010250+00010000").unwrap(),
            (1, Reply::value("uga", &[10_250, 10_000]))
        );
    }

    #[test]
    fn rejects_garbage() {
        for line in ["", "x0g", "g", "gg+1", "g0g+", "g0g+12a", "g0@Exyz", "g0g+99999999999"] {
            assert!(
                matches!(Reply::parse(line), Err(RangefinderError::InvalidResponse(_))),
                "{line:?}"
            );
        }
        assert!(Command::decode("s0zz").is_err());
        assert!(Command::decode("s0uu+00000002").is_err());
    }

    #[test]
    fn field_width_is_checked_before_encoding() {
        assert!(Command::SetOffset(MAX_FIELD).check_fields().is_ok());
        assert!(Command::SetOffset(-MAX_FIELD).check_fields().is_ok());
        assert!(matches!(
            Command::SetOffset(MAX_FIELD + 1).check_fields(),
            Err(RangefinderError::OutOfRange(_))
        ));
        assert!(Command::Track {
            delay: Some(i32::MIN)
        }
        .check_fields()
        .is_err());
        assert!(Command::Measure.check_fields().is_ok());
    }
}
