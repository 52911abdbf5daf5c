use thiserror::Error;

use crate::DeviceTypeId;

pub type Result<T, E = CatalogError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown device type: {0}")]
    UnknownDeviceType(String),
    #[error("{device_type} has no method with field id {field_id}")]
    MethodNotFound {
        device_type: DeviceTypeId,
        field_id: u32,
    },
    #[error("{device_type} has no method named {name:?}")]
    MethodNameNotFound {
        device_type: DeviceTypeId,
        name: String,
    },
    #[error("{device_type} has no variable with field id {field_id}")]
    VariableNotFound {
        device_type: DeviceTypeId,
        field_id: u32,
    },
    #[error("{device_type} has no error with field id {field_id}")]
    ErrorNotFound {
        device_type: DeviceTypeId,
        field_id: u32,
    },
    #[error("export failed: {0}")]
    Export(String),
}
