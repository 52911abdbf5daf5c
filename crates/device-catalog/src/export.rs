use crate::{CatalogError, DeviceMetadata, Result};

/// Serialize a set of device metadata as pretty JSON.
pub fn to_json<'a>(devices: impl IntoIterator<Item = &'a DeviceMetadata>) -> Result<String> {
    let list: Vec<&DeviceMetadata> = devices.into_iter().collect();
    serde_json::to_string_pretty(&list).map_err(|e| CatalogError::Export(e.to_string()))
}

/// Serialize a set of device metadata as YAML.
pub fn to_yaml<'a>(devices: impl IntoIterator<Item = &'a DeviceMetadata>) -> Result<String> {
    let list: Vec<&DeviceMetadata> = devices.into_iter().collect();
    serde_yaml::to_string(&list).map_err(|e| CatalogError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, DeviceTypeId};

    #[test]
    fn json_lists_method_arguments() {
        let json = to_json([catalog().device(DeviceTypeId::Panel)]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let methods = &v[0]["methods"];
        assert_eq!(methods["2015"]["name"], "FindHome");
        assert_eq!(methods["2015"]["arguments"][0]["data_type"], "Int32");
        assert_eq!(v[0]["device_type"], "panel");
    }

    #[test]
    fn yaml_covers_every_type() {
        let yaml = to_yaml(catalog().iter()).unwrap();
        for t in DeviceTypeId::ALL {
            assert!(yaml.contains(&format!("type_id: {}", t.id())));
        }
    }
}
