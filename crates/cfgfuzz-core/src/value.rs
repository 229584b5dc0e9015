use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::SchemaKind;

/// A generated configuration value.
///
/// Serializes untagged, so a value tree renders as plain YAML or JSON. Maps
/// are ordered to keep serialized output (and therefore content digests)
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GeneratedValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<GeneratedValue>),
    Map(BTreeMap<String, GeneratedValue>),
}

impl GeneratedValue {
    /// Empty map, the shape of every top-level configuration document.
    pub fn empty_map() -> Self {
        GeneratedValue::Map(BTreeMap::new())
    }

    /// Schema kind this value would infer to.
    pub fn kind(&self) -> SchemaKind {
        match self {
            GeneratedValue::Null => SchemaKind::Null,
            GeneratedValue::Bool(_) => SchemaKind::Boolean,
            GeneratedValue::Integer(_) => SchemaKind::Integer,
            GeneratedValue::Float(_) => SchemaKind::Number,
            GeneratedValue::String(_) => SchemaKind::String,
            GeneratedValue::List(_) => SchemaKind::Array,
            GeneratedValue::Map(_) => SchemaKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GeneratedValue::Integer(value) => Some(*value as f64),
            GeneratedValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, GeneratedValue>> {
        match self {
            GeneratedValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a parsed JSON document into a value tree.
    ///
    /// Integers that do not fit `i64` degrade to floats.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => GeneratedValue::Null,
            serde_json::Value::Bool(value) => GeneratedValue::Bool(*value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => GeneratedValue::Integer(value),
                None => GeneratedValue::Float(number.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(value) => GeneratedValue::String(value.clone()),
            serde_json::Value::Array(items) => {
                GeneratedValue::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => GeneratedValue::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert a parsed YAML document into a value tree.
    ///
    /// Non-string mapping keys are stringified and tags are dropped in favour
    /// of the tagged value.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => GeneratedValue::Null,
            serde_yaml::Value::Bool(value) => GeneratedValue::Bool(*value),
            serde_yaml::Value::Number(number) => match number.as_i64() {
                Some(value) => GeneratedValue::Integer(value),
                None => GeneratedValue::Float(number.as_f64().unwrap_or_default()),
            },
            serde_yaml::Value::String(value) => GeneratedValue::String(value.clone()),
            serde_yaml::Value::Sequence(items) => {
                GeneratedValue::List(items.iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => GeneratedValue::Map(
                map.iter()
                    .map(|(key, value)| (yaml_key(key), Self::from_yaml(value)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl From<&str> for GeneratedValue {
    fn from(value: &str) -> Self {
        GeneratedValue::String(value.to_string())
    }
}

impl From<String> for GeneratedValue {
    fn from(value: String) -> Self {
        GeneratedValue::String(value)
    }
}

impl From<i64> for GeneratedValue {
    fn from(value: i64) -> Self {
        GeneratedValue::Integer(value)
    }
}

impl From<f64> for GeneratedValue {
    fn from(value: f64) -> Self {
        GeneratedValue::Float(value)
    }
}

impl From<bool> for GeneratedValue {
    fn from(value: bool) -> Self {
        GeneratedValue::Bool(value)
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(value) => value.clone(),
        serde_yaml::Value::Bool(value) => value.to_string(),
        serde_yaml::Value::Number(number) => number.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|encoded| encoded.trim().to_string())
            .unwrap_or_default(),
    }
}
