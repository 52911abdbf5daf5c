//! device-dispatch: turns one incoming method call on a device node into a
//! validated command for the device communication interface.
//!
//! Calls are checked against the [`device_catalog`] method contracts (known
//! method id, exact arity, exact argument types) before anything reaches the
//! interface. Device-level results are passed back untouched.

mod value;
pub use value::{ParseValueError, Value};

mod status;
pub use status::StatusCode;

mod error;
pub use error::{DispatchError, Result};

mod traits;
pub use traits::DeviceCommInterface;

mod dispatcher;
pub use dispatcher::{DispatchOutcome, Dispatcher, PendingCall};

mod metrics;
pub use metrics::DispatchMetrics;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{LoggingInterface, RecordedCall, RecordingInterface};
