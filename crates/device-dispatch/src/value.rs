use core::fmt;
use core::str::FromStr;
use device_catalog::DataType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A typed method argument as received from the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Float(f32),
    Double(f64),
    String(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int32(_) => DataType::Int32,
            Value::UInt32(_) => DataType::UInt32,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::String(_) => DataType::String,
        }
    }

    /// Numeric view of the value; `None` for booleans and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int32(v) => Some(f64::from(v)),
            Value::UInt32(v) => Some(f64::from(v)),
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            Value::Boolean(_) | Value::String(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseValueError {
    #[error("expected <type>:<value>, got {0:?}")]
    Syntax(String),
    #[error("unknown argument type {0:?}")]
    UnknownType(String),
    #[error("invalid {kind} literal {literal:?}")]
    Literal { kind: &'static str, literal: String },
}

/// Parses the `type:value` notation used on the command line, e.g.
/// `uint32:3`, `double:0.25`, `bool:true`, `string:abc`.
impl FromStr for Value {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, literal) = s
            .split_once(':')
            .ok_or_else(|| ParseValueError::Syntax(s.to_string()))?;
        let literal = literal.trim();
        let bad = |kind: &'static str| ParseValueError::Literal {
            kind,
            literal: literal.to_string(),
        };
        match kind.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => literal.parse().map(Value::Boolean).map_err(|_| bad("boolean")),
            "i32" | "int32" => literal.parse().map(Value::Int32).map_err(|_| bad("int32")),
            "u32" | "uint32" => literal.parse().map(Value::UInt32).map_err(|_| bad("uint32")),
            "f32" | "float" => literal.parse().map(Value::Float).map_err(|_| bad("float")),
            "f64" | "double" => literal.parse().map(Value::Double).map_err(|_| bad("double")),
            "str" | "string" => Ok(Value::String(literal.to_string())),
            other => Err(ParseValueError::UnknownType(other.to_string())),
        }
    }
}
