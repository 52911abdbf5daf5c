use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::tables::table;
use crate::{
    CatalogError, DeviceTypeId, ErrorDescriptor, FieldKind, MethodDescriptor, Result,
    VariableDescriptor,
};

/// Metadata of one device type, keyed by field id.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceMetadata {
    pub device_type: DeviceTypeId,
    pub type_id: u32,
    pub variables: BTreeMap<u32, VariableDescriptor>,
    pub errors: BTreeMap<u32, ErrorDescriptor>,
    pub methods: BTreeMap<u32, MethodDescriptor>,
}

impl DeviceMetadata {
    fn build(device_type: DeviceTypeId) -> Self {
        let t = table(device_type);
        Self {
            device_type,
            type_id: device_type.id(),
            variables: t.variables.iter().map(|v| (v.field_id, *v)).collect(),
            errors: t.errors.iter().map(|e| (e.field_id, *e)).collect(),
            methods: t.methods.iter().map(|m| (m.field_id, *m)).collect(),
        }
    }

    pub fn method(&self, field_id: u32) -> Option<&MethodDescriptor> {
        self.methods.get(&field_id)
    }

    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn field_kind(&self, field_id: u32) -> Option<FieldKind> {
        if self.variables.contains_key(&field_id) {
            Some(FieldKind::Variable)
        } else if self.errors.contains_key(&field_id) {
            Some(FieldKind::Error)
        } else if self.methods.contains_key(&field_id) {
            Some(FieldKind::Method)
        } else {
            None
        }
    }
}

/// All device types, in [`DeviceTypeId::ALL`] order.
#[derive(Debug, Serialize)]
pub struct DeviceCatalog {
    devices: Vec<DeviceMetadata>,
}

/// Position of `device_type` in [`DeviceTypeId::ALL`], and so in `devices`.
fn slot(device_type: DeviceTypeId) -> usize {
    match device_type {
        DeviceTypeId::Edge => 0,
        DeviceTypeId::Mpes => 1,
        DeviceTypeId::Panel => 2,
        DeviceTypeId::Actuator => 3,
        DeviceTypeId::Ccd => 4,
        DeviceTypeId::Psd => 5,
        DeviceTypeId::Rangefinder => 6,
    }
}

static CATALOG: OnceLock<DeviceCatalog> = OnceLock::new();

/// The process-wide catalog, constructed on first access.
pub fn catalog() -> &'static DeviceCatalog {
    CATALOG.get_or_init(|| {
        let devices: Vec<DeviceMetadata> = DeviceTypeId::ALL
            .into_iter()
            .map(DeviceMetadata::build)
            .collect();
        tracing::debug!(device_types = devices.len(), "device catalog built");
        DeviceCatalog { devices }
    })
}

/// Shorthand for `catalog().lookup_method(..)`.
pub fn lookup_method(device_type: DeviceTypeId, field_id: u32) -> Result<&'static MethodDescriptor> {
    catalog().lookup_method(device_type, field_id)
}

impl DeviceCatalog {
    pub fn device(&self, device_type: DeviceTypeId) -> &DeviceMetadata {
        &self.devices[slot(device_type)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceMetadata> {
        self.devices.iter()
    }

    pub fn lookup_method(
        &self,
        device_type: DeviceTypeId,
        field_id: u32,
    ) -> Result<&MethodDescriptor> {
        self.device(device_type)
            .method(field_id)
            .ok_or(CatalogError::MethodNotFound {
                device_type,
                field_id,
            })
    }

    pub fn lookup_method_by_name(
        &self,
        device_type: DeviceTypeId,
        name: &str,
    ) -> Result<&MethodDescriptor> {
        self.device(device_type)
            .method_by_name(name)
            .ok_or_else(|| CatalogError::MethodNameNotFound {
                device_type,
                name: name.to_string(),
            })
    }

    pub fn lookup_variable(
        &self,
        device_type: DeviceTypeId,
        field_id: u32,
    ) -> Result<&VariableDescriptor> {
        self.device(device_type)
            .variables
            .get(&field_id)
            .ok_or(CatalogError::VariableNotFound {
                device_type,
                field_id,
            })
    }

    pub fn lookup_error(
        &self,
        device_type: DeviceTypeId,
        field_id: u32,
    ) -> Result<&ErrorDescriptor> {
        self.device(device_type)
            .errors
            .get(&field_id)
            .ok_or(CatalogError::ErrorNotFound {
                device_type,
                field_id,
            })
    }

    pub fn field_kind(&self, device_type: DeviceTypeId, field_id: u32) -> Option<FieldKind> {
        self.device(device_type).field_kind(field_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::*;
    use crate::{AccessLevel, DataType, DefaultValue};
    use std::collections::HashSet;

    #[test]
    fn every_type_is_present_in_order() {
        let cat = catalog();
        for t in DeviceTypeId::ALL {
            let dev = cat.device(t);
            assert_eq!(dev.device_type, t);
            assert_eq!(dev.type_id, t.id());
        }
    }

    #[test]
    fn slots_follow_the_all_order() {
        for (i, t) in DeviceTypeId::ALL.into_iter().enumerate() {
            assert_eq!(slot(t), i, "{t}");
        }
    }

    #[test]
    fn named_reading_and_fault_ids_resolve() {
        let cat = catalog();
        assert_eq!(
            cat.device(DeviceTypeId::Rangefinder).variables[&RANGEFINDER_TEMP].name,
            "Temp"
        );
        assert_eq!(
            cat.device(DeviceTypeId::Ccd).variables[&CCD_PHI_NOMINAL].name,
            "phiNominal"
        );
        assert_eq!(
            cat.device(DeviceTypeId::Actuator).errors[&ACTUATOR_ERROR13].name,
            "Error13"
        );
        assert_eq!(
            cat.field_kind(DeviceTypeId::Panel, PANEL_Z_ROT),
            Some(FieldKind::Variable)
        );
    }

    #[test]
    fn field_ids_are_unique_and_belong_to_their_type() {
        for dev in catalog().iter() {
            let mut seen = HashSet::new();
            let ids = dev
                .variables
                .keys()
                .chain(dev.errors.keys())
                .chain(dev.methods.keys());
            for id in ids {
                assert!(seen.insert(*id), "duplicate field id {id} in {}", dev.device_type);
            }
            for id in dev.variables.keys().chain(dev.methods.keys()) {
                assert!(*id > dev.type_id && *id < dev.type_id + 100);
            }
        }
    }

    #[test]
    fn lookup_returns_declared_arity() {
        let cat = catalog();
        for dev in cat.iter() {
            for (id, m) in &dev.methods {
                let found = cat.lookup_method(dev.device_type, *id).unwrap();
                assert_eq!(found.arity(), m.arguments.len());
                assert_eq!(found.name, m.name);
            }
        }
        let coords = lookup_method(DeviceTypeId::Panel, PANEL_MOVE_TO_COORDS).unwrap();
        assert_eq!(coords.arity(), 6);
        assert!(coords.arguments.iter().all(|a| a.data_type == DataType::Double));
    }

    #[test]
    fn panel_surface() {
        let cat = catalog();
        let panel = cat.device(DeviceTypeId::Panel);
        assert_eq!(panel.methods.len(), 10);
        let deltas = cat
            .lookup_method(DeviceTypeId::Panel, PANEL_MOVE_DELTA_LENGTHS)
            .unwrap();
        assert_eq!(deltas.arity(), 6);
        assert!(deltas.arguments.iter().all(|a| a.data_type == DataType::Float));
        let clear = cat
            .lookup_method_by_name(DeviceTypeId::Panel, "ClearError")
            .unwrap();
        assert_eq!(clear.field_id, PANEL_CLEAR_ERROR);
        assert_eq!(clear.arity(), 1);
        assert_eq!(clear.arguments[0].data_type, DataType::Int32);

        let radius = cat
            .lookup_variable(DeviceTypeId::Panel, PANEL_SAFETY_RADIUS)
            .unwrap();
        assert_eq!(radius.access, AccessLevel::ReadWrite);
        assert_eq!(radius.default_value, DefaultValue::Double(60.0));
        assert!(panel.errors.is_empty());
    }

    #[test]
    fn edge_align_takes_four_arguments() {
        let align = lookup_method(DeviceTypeId::Edge, EDGE_ALIGN).unwrap();
        let types: Vec<DataType> = align.arguments.iter().map(|a| a.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::UInt32,
                DataType::UInt32,
                DataType::Double,
                DataType::Boolean
            ]
        );
        assert_eq!(
            align.arguments[2].default_value,
            Some(DefaultValue::Double(0.25))
        );
        assert_eq!(
            align.signature(),
            "Align(panelToMove: UInt32, panelToFix: UInt32, alignFraction: Double = 0.25, execute: Boolean)"
        );
    }

    #[test]
    fn ccd_methods_take_no_arguments() {
        let ccd = catalog().device(DeviceTypeId::Ccd);
        assert_eq!(ccd.methods.len(), 3);
        assert!(ccd.methods.values().all(|m| m.arity() == 0));
        assert_eq!(ccd.variables.len(), 13);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let cat = catalog();
        let err = cat.lookup_method(DeviceTypeId::Ccd, PANEL_STOP).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MethodNotFound {
                device_type: DeviceTypeId::Ccd,
                field_id: PANEL_STOP
            }
        ));
        assert!(cat.lookup_method_by_name(DeviceTypeId::Edge, "Fly").is_err());
        assert_eq!(
            cat.field_kind(DeviceTypeId::Actuator, ACTUATOR_ERROR0),
            Some(FieldKind::Error)
        );
        assert_eq!(
            cat.field_kind(DeviceTypeId::Edge, EDGE_POSITION),
            Some(FieldKind::Variable)
        );
        assert_eq!(cat.field_kind(DeviceTypeId::Edge, 42), None);
    }

    #[test]
    fn device_type_parsing() {
        assert_eq!("panel".parse::<DeviceTypeId>().unwrap(), DeviceTypeId::Panel);
        assert_eq!("CCD".parse::<DeviceTypeId>().unwrap(), DeviceTypeId::Ccd);
        assert_eq!("1000".parse::<DeviceTypeId>().unwrap(), DeviceTypeId::Edge);
        assert!("1001".parse::<DeviceTypeId>().is_err());
        assert!("mirror".parse::<DeviceTypeId>().is_err());
        assert_eq!(DeviceTypeId::from_id(3100), Some(DeviceTypeId::Ccd));
    }
}
