//! Canonical attribute values handed to sinks.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::field::FieldKey;

/// A key and its canonical external value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: FieldKey,
    pub value: AttrValue,
}

/// The external form of a field value, as produced by
/// [`canonicalize`](crate::format::canonicalize).
///
/// Sinks encode these as they are, without reinterpreting them.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Group(Vec<Attribute>),
    Json(serde_json::Value),
}

impl Attribute {
    pub fn new(key: impl Into<FieldKey>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl AttrValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into a [`log`] key-value value borrowing from `self`.
    pub fn as_log_value(&self) -> log::kv::Value<'_> {
        match self {
            Self::Null => log::kv::Value::null(),
            Self::Bool(v) => log::kv::Value::from(*v),
            Self::Int(v) => log::kv::Value::from(*v),
            Self::Uint(v) => log::kv::Value::from(*v),
            Self::Float(v) => log::kv::Value::from(*v),
            Self::String(v) => log::kv::Value::from(v.as_str()),
            Self::Group(_) | Self::Json(_) => log::kv::Value::from_serde(self),
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl Serialize for AttrValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Uint(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Group(attributes) => {
                let mut map = serializer.serialize_map(Some(attributes.len()))?;
                for attribute in attributes {
                    map.serialize_entry(&*attribute.key, &attribute.value)?;
                }
                map.end()
            }
            Self::Json(v) => v.serialize(serializer),
        }
    }
}
