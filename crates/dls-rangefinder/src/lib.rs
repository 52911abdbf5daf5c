//! dls-rangefinder: driver for DLS laser distance sensors
//!
//! The driver talks a line-oriented ASCII protocol over a [`Link`]. The
//! `serial` feature provides the real serial-port backend; the default
//! `mock` feature provides a simulated sensor so binaries and tests run on
//! any host without hardware attached.

mod error;
pub use error::{RangefinderError, Result};

mod cancel;
pub use cancel::CancelToken;

mod config;
pub use config::{load_config_file, RangefinderConfig};

pub mod protocol;
pub use protocol::{Command, Reply};

mod traits;
pub use traits::{Link, PortInfo};

mod driver;
pub use driver::{
    mm_to_tenths, MeasuringCharacteristic, OutputFilter, Rangefinder, Sample, FILTER_UNCHANGED,
};

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockLink;

#[cfg(feature = "serial")]
mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialLink;
