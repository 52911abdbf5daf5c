use device_catalog::{DeviceTypeId, Identity};
use std::sync::Mutex;
use tracing::info;

use crate::{DeviceCommInterface, StatusCode, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub device_type: DeviceTypeId,
    pub identity: Identity,
    pub method_id: u32,
    pub args: Vec<Value>,
}

/// In-process interface that records every call and answers with a fixed
/// status (`Good` unless changed).
pub struct RecordingInterface {
    status: Mutex<StatusCode>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingInterface {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(StatusCode::Good),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        if let Ok(mut slot) = self.status.lock() {
            *slot = status;
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for RecordingInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCommInterface for RecordingInterface {
    fn operate(
        &self,
        device_type: DeviceTypeId,
        identity: &Identity,
        method_id: u32,
        args: &[Value],
    ) -> StatusCode {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                device_type,
                identity: identity.clone(),
                method_id,
                args: args.to_vec(),
            });
        } else {
            // poisoned: a recording thread panicked
            return StatusCode::BadCommunicationError;
        }
        self.status
            .lock()
            .map(|s| *s)
            .unwrap_or(StatusCode::BadCommunicationError)
    }
}

/// Interface with no hardware behind it: logs each call and reports `Good`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterface;

impl DeviceCommInterface for LoggingInterface {
    fn operate(
        &self,
        device_type: DeviceTypeId,
        identity: &Identity,
        method_id: u32,
        args: &[Value],
    ) -> StatusCode {
        let rendered = args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            device_type = %device_type,
            identity = %identity,
            method_id,
            args = %rendered,
            "operate (no hardware attached)"
        );
        StatusCode::Good
    }
}
