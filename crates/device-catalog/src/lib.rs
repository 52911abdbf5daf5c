//! device-catalog: immutable per-device-type metadata for the PAS alignment
//! devices (observable variables, error flags and callable methods).
//!
//! The catalog is built once on first use and never mutated afterwards. It is
//! the single source of truth for the dispatcher's argument contracts and for
//! tooling that publishes the command surface.

mod types;
pub use types::{
    AccessLevel, ArgumentDescriptor, DataType, DefaultValue, DeviceTypeId, ErrorDescriptor,
    FieldKind, Identity, MethodDescriptor, VariableDescriptor,
};

mod error;
pub use error::{CatalogError, Result};

pub mod ids;

mod tables;

mod catalog;
pub use catalog::{catalog, lookup_method, DeviceCatalog, DeviceMetadata};

mod export;
pub use export::{to_json, to_yaml};
