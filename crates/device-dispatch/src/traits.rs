use device_catalog::{DeviceTypeId, Identity};
use std::sync::Arc;

use crate::{StatusCode, Value};

/// Boundary to the component that actually drives hardware.
///
/// Implementations own any per-identity locking: the dispatcher may call
/// `operate` concurrently from several worker threads and never serializes
/// calls itself.
pub trait DeviceCommInterface: Send + Sync {
    /// Execute `method_id` on the unit named by `identity`.
    fn operate(
        &self,
        device_type: DeviceTypeId,
        identity: &Identity,
        method_id: u32,
        args: &[Value],
    ) -> StatusCode;
}

impl<T: DeviceCommInterface + ?Sized> DeviceCommInterface for Arc<T> {
    fn operate(
        &self,
        device_type: DeviceTypeId,
        identity: &Identity,
        method_id: u32,
        args: &[Value],
    ) -> StatusCode {
        (**self).operate(device_type, identity, method_id, args)
    }
}

impl<T: DeviceCommInterface + ?Sized> DeviceCommInterface for Box<T> {
    fn operate(
        &self,
        device_type: DeviceTypeId,
        identity: &Identity,
        method_id: u32,
        args: &[Value],
    ) -> StatusCode {
        (**self).operate(device_type, identity, method_id, args)
    }
}
