use crate::field::FieldKey;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A formatted, display-ready sensor value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Integer(n) => write!(f, "{n}"),
            DisplayValue::Float(n) => write!(f, "{n}"),
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// Value of one entry in a sensor's attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Integer(value as i64)
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// What one projector reports for one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub key: FieldKey,
    pub unique_id: String,
    /// `None` means the field has never produced a value.
    pub value: Option<DisplayValue>,
    pub attributes: Attributes,
    pub available: bool,
}
