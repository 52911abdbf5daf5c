use thiserror::Error;

pub type Result<T, E = RangefinderError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RangefinderError {
    #[error("error opening {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(String),
    #[error("timeout waiting for the sensor")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("sensor reported error E{code:03}")]
    Device { code: u16 },
    #[error("value out of range: {0}")]
    OutOfRange(String),
    #[error("unknown measuring characteristic: {0}")]
    UnknownCharacteristic(String),
    #[error("not tracking")]
    NotTracking,
    #[error("operation not allowed while tracking")]
    TrackingActive,
}
