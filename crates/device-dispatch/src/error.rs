use device_catalog::DeviceTypeId;
use thiserror::Error;

use crate::StatusCode;

pub type Result<T, E = DispatchError> = core::result::Result<T, E>;

/// A call rejected before it reached the device communication interface.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("{device_type} has no method with id {method_id}")]
    InvalidMethod {
        device_type: DeviceTypeId,
        method_id: u32,
    },
    #[error("{method} expects {expected} argument(s), got {actual}")]
    InvalidArgumentCount {
        method: &'static str,
        expected: usize,
        actual: usize,
    },
    /// `results` holds one entry per argument: `Good` or `BadTypeMismatch`.
    #[error("{method}: argument type mismatch at position(s) {positions:?}", positions = mismatched_positions(.results))]
    TypeMismatch {
        method: &'static str,
        results: Vec<StatusCode>,
    },
}

fn mismatched_positions(results: &[StatusCode]) -> Vec<usize> {
    results
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_good())
        .map(|(i, _)| i)
        .collect()
}

impl DispatchError {
    /// Status reported back to the remote caller.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::InvalidMethod { .. } | DispatchError::InvalidArgumentCount { .. } => {
                StatusCode::BadInvalidArgument
            }
            DispatchError::TypeMismatch { .. } => StatusCode::BadTypeMismatch,
        }
    }

    /// Label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::InvalidMethod { .. } => "invalid_method",
            DispatchError::InvalidArgumentCount { .. } => "invalid_argument_count",
            DispatchError::TypeMismatch { .. } => "type_mismatch",
        }
    }
}
