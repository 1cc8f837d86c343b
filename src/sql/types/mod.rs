use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
}

impl DataType {
    /// Maps a declared type word (case-insensitive, without size hint) to a data type
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_ref() {
            "int" | "integer" => DataType::Integer,
            "float" | "double" => DataType::Float,
            "varchar" | "char" | "text" | "string" => DataType::Text,
            _ => return None,
        })
    }

    /// Value used to fill existing records when a field is added
    pub fn zero(&self) -> Value {
        match self {
            DataType::Integer => Value::Integer(0),
            DataType::Float => Value::Float(0.0),
            DataType::Text => Value::Text(String::new()),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Text => "text",
        })
    }
}

/// Runtime value stored in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Converts the raw text of one record field to the declared type
    pub fn parse(datatype: DataType, raw: &str) -> Result<Self> {
        let conversion_err = || {
            Error::RecordConversion(format!("cannot convert '{}' to {}", raw, datatype))
        };
        Ok(match datatype {
            DataType::Integer => Value::Integer(raw.trim().parse().map_err(|_| conversion_err())?),
            DataType::Float => Value::Float(raw.trim().parse().map_err(|_| conversion_err())?),
            DataType::Text => Value::Text(raw.to_string()),
        })
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Converts a value to the given type. Integers widen to floats, nothing else converts.
    pub fn cast(self, datatype: DataType) -> Result<Self> {
        match (self, datatype) {
            (Value::Integer(i), DataType::Float) => Ok(Value::Float(i as f64)),
            (v, dt) if v.datatype() == dt => Ok(v),
            (v, dt) => Err(Error::TypeMismatch(format!("cannot store {} value {} in a {} field", v.datatype(), v, dt))),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on integral floats so they parse back as floats
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Numbers compare with numbers, text with text
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (_, _) => None,
        }
    }
}

/// A row is a vector of values
pub type Row = Vec<Value>;
