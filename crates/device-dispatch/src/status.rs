use core::fmt;
use core::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

/// Result status of a device call, mirroring the automation server's status
/// codes. `Device` carries any other code reported by the hardware layer.
///
/// Equality and hashing go through [`StatusCode::code`], so `Device(0)` is
/// `Good` and `Device(0x8005_0000)` is `BadCommunicationError`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum StatusCode {
    Good,
    BadInvalidArgument,
    BadTypeMismatch,
    BadInvalidState,
    BadNotImplemented,
    BadNotWritable,
    BadCommunicationError,
    Device(u32),
}

impl StatusCode {
    pub fn code(self) -> u32 {
        match self {
            StatusCode::Good => 0x0000_0000,
            StatusCode::BadInvalidArgument => 0x80AB_0000,
            StatusCode::BadTypeMismatch => 0x8074_0000,
            StatusCode::BadInvalidState => 0x80AF_0000,
            StatusCode::BadNotImplemented => 0x8040_0000,
            StatusCode::BadNotWritable => 0x803B_0000,
            StatusCode::BadCommunicationError => 0x8005_0000,
            StatusCode::Device(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0x0000_0000 => StatusCode::Good,
            0x80AB_0000 => StatusCode::BadInvalidArgument,
            0x8074_0000 => StatusCode::BadTypeMismatch,
            0x80AF_0000 => StatusCode::BadInvalidState,
            0x8040_0000 => StatusCode::BadNotImplemented,
            0x803B_0000 => StatusCode::BadNotWritable,
            0x8005_0000 => StatusCode::BadCommunicationError,
            other => StatusCode::Device(other),
        }
    }

    pub fn is_good(self) -> bool {
        self.code() == 0
    }

    pub fn is_bad(self) -> bool {
        self.code() & 0x8000_0000 != 0
    }

    /// Short label, suitable for logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Good => "Good",
            StatusCode::BadInvalidArgument => "BadInvalidArgument",
            StatusCode::BadTypeMismatch => "BadTypeMismatch",
            StatusCode::BadInvalidState => "BadInvalidState",
            StatusCode::BadNotImplemented => "BadNotImplemented",
            StatusCode::BadNotWritable => "BadNotWritable",
            StatusCode::BadCommunicationError => "BadCommunicationError",
            StatusCode::Device(_) => "Device",
        }
    }
}

impl PartialEq for StatusCode {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for StatusCode {}

impl Hash for StatusCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Device(code) => match StatusCode::from_code(*code) {
                StatusCode::Device(code) => write!(f, "Device(0x{code:08X})"),
                known => f.write_str(known.name()),
            },
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back() {
        for s in [
            StatusCode::Good,
            StatusCode::BadInvalidArgument,
            StatusCode::BadTypeMismatch,
            StatusCode::BadInvalidState,
            StatusCode::BadNotImplemented,
            StatusCode::BadNotWritable,
            StatusCode::BadCommunicationError,
        ] {
            assert_eq!(StatusCode::from_code(s.code()), s);
        }
        assert_eq!(StatusCode::from_code(0x8123_0000), StatusCode::Device(0x8123_0000));
    }

    #[test]
    fn severity() {
        assert!(StatusCode::Good.is_good());
        assert!(!StatusCode::Good.is_bad());
        assert!(StatusCode::BadTypeMismatch.is_bad());
        assert!(!StatusCode::Device(0x0040_0000).is_bad());
        assert_eq!(StatusCode::Device(0x8001_0000).to_string(), "Device(0x80010000)");
    }

    #[test]
    fn device_codes_with_a_name_are_the_named_status() {
        assert_eq!(StatusCode::Device(0), StatusCode::Good);
        assert!(StatusCode::Device(0).is_good());
        assert_eq!(StatusCode::Device(0).to_string(), "Good");
        assert_eq!(
            StatusCode::Device(0x8005_0000),
            StatusCode::BadCommunicationError
        );
        assert_ne!(StatusCode::Device(0x8123_0000), StatusCode::Good);

        let set: std::collections::HashSet<_> =
            [StatusCode::Device(0x80AB_0000), StatusCode::BadInvalidArgument]
                .into_iter()
                .collect();
        assert_eq!(set.len(), 1);
    }
}
