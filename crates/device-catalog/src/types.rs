use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Device class addressed by a call. The numeric id is the node type id the
/// automation server publishes; every field id of a type is `id + n`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTypeId {
    Edge,
    Mpes,
    Panel,
    Actuator,
    Ccd,
    Psd,
    Rangefinder,
}

impl DeviceTypeId {
    pub const ALL: [DeviceTypeId; 7] = [
        DeviceTypeId::Edge,
        DeviceTypeId::Mpes,
        DeviceTypeId::Panel,
        DeviceTypeId::Actuator,
        DeviceTypeId::Ccd,
        DeviceTypeId::Psd,
        DeviceTypeId::Rangefinder,
    ];

    pub fn id(self) -> u32 {
        match self {
            DeviceTypeId::Edge => 1000,
            DeviceTypeId::Mpes => 1100,
            DeviceTypeId::Panel => 2000,
            DeviceTypeId::Actuator => 2100,
            DeviceTypeId::Ccd => 3100,
            DeviceTypeId::Psd => 3200,
            DeviceTypeId::Rangefinder => 3300,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceTypeId::Edge => "Edge",
            DeviceTypeId::Mpes => "MPES",
            DeviceTypeId::Panel => "Panel",
            DeviceTypeId::Actuator => "Actuator",
            DeviceTypeId::Ccd => "CCD",
            DeviceTypeId::Psd => "PSD",
            DeviceTypeId::Rangefinder => "Rangefinder",
        }
    }
}

impl fmt::Display for DeviceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceTypeId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Ok(id) = t.parse::<u32>() {
            return Self::from_id(id).ok_or(CatalogError::UnknownDeviceType(t.to_string()));
        }
        match t.to_ascii_lowercase().as_str() {
            "edge" => Ok(DeviceTypeId::Edge),
            "mpes" => Ok(DeviceTypeId::Mpes),
            "panel" => Ok(DeviceTypeId::Panel),
            "actuator" | "act" => Ok(DeviceTypeId::Actuator),
            "ccd" => Ok(DeviceTypeId::Ccd),
            "psd" => Ok(DeviceTypeId::Psd),
            "rangefinder" => Ok(DeviceTypeId::Rangefinder),
            _ => Err(CatalogError::UnknownDeviceType(t.to_string())),
        }
    }
}

/// Scalar data types a method argument may declare.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    UInt32,
    Float,
    Double,
    String,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::Int32 => "Int32",
            DataType::UInt32 => "UInt32",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::String => "String",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i32),
    Double(f64),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Bool(b) => write!(f, "{b}"),
            DefaultValue::Int(i) => write!(f, "{i}"),
            DefaultValue::Double(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    ReadWrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VariableDescriptor {
    pub field_id: u32,
    pub name: &'static str,
    pub default_value: DefaultValue,
    pub is_state: bool,
    pub access: AccessLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ErrorDescriptor {
    pub field_id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub default_value: DefaultValue,
    pub is_state: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArgumentDescriptor {
    pub name: &'static str,
    pub data_type: DataType,
    pub description: &'static str,
    /// Suggested value for callers; the argument is still positional and required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MethodDescriptor {
    pub field_id: u32,
    pub name: &'static str,
    pub arguments: &'static [ArgumentDescriptor],
}

impl MethodDescriptor {
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Human readable signature, e.g. `FindHome(direction: Int32)`.
    pub fn signature(&self) -> String {
        let args = self
            .arguments
            .iter()
            .map(|a| match a.default_value {
                Some(d) => format!("{}: {} = {d}", a.name, a.data_type),
                None => format!("{}: {}", a.name, a.data_type),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({args})", self.name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Variable,
    Error,
    Method,
}

/// Names one physical unit of a device type. Passed through the dispatcher
/// untouched; only the communication interface interprets it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub serial_number: i32,
    #[serde(default)]
    pub e_address: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub name: String,
}

impl Identity {
    pub fn with_serial(serial_number: i32) -> Self {
        Self {
            serial_number,
            ..Self::default()
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "#{}", self.serial_number)
        } else {
            write!(f, "{} (#{})", self.name, self.serial_number)
        }
    }
}
