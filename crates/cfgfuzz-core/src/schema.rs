use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::GeneratedValue;

/// Kind of value a schema node describes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    #[default]
    Any,
}

impl SchemaKind {
    /// Map a JSON Schema `type` keyword to a kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(SchemaKind::String),
            "integer" => Some(SchemaKind::Integer),
            "number" => Some(SchemaKind::Number),
            "boolean" => Some(SchemaKind::Boolean),
            "object" => Some(SchemaKind::Object),
            "array" => Some(SchemaKind::Array),
            "null" => Some(SchemaKind::Null),
            "any" => Some(SchemaKind::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::Null => "null",
            SchemaKind::Any => "any",
        }
    }

    /// Zero value used when generation hits the depth bound.
    pub fn zero_value(&self) -> GeneratedValue {
        match self {
            SchemaKind::String => GeneratedValue::String(String::new()),
            SchemaKind::Integer => GeneratedValue::Integer(0),
            SchemaKind::Number => GeneratedValue::Float(0.0),
            SchemaKind::Boolean => GeneratedValue::Bool(false),
            SchemaKind::Object => GeneratedValue::empty_map(),
            SchemaKind::Array => GeneratedValue::List(Vec::new()),
            SchemaKind::Null | SchemaKind::Any => GeneratedValue::Null,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses JSON Schema keywords plus the short aliases accepted in
/// configuration overrides (`int`, `str`, `bool`, `float`, `map`, `list`).
impl FromStr for SchemaKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if let Some(kind) = SchemaKind::from_keyword(&normalized) {
            return Ok(kind);
        }
        match normalized.as_str() {
            "int" | "long" => Ok(SchemaKind::Integer),
            "str" | "text" => Ok(SchemaKind::String),
            "bool" => Ok(SchemaKind::Boolean),
            "float" | "double" => Ok(SchemaKind::Number),
            "map" | "dict" => Ok(SchemaKind::Object),
            "list" | "seq" => Ok(SchemaKind::Array),
            _ => Err(Error::InvalidValue(format!("unknown schema type '{value}'"))),
        }
    }
}

/// Recursive description of the permitted shape of one configuration value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub kind: SchemaKind,
    /// Declared properties (objects only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    /// Item schema (arrays only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,
    /// Allowed literals; when non-empty they override every other rule.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<GeneratedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<GeneratedValue>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    /// Terminal node pinned to `value`: the single-member enum means
    /// generation can never vary it.
    pub fn frozen(value: GeneratedValue) -> Self {
        Self {
            kind: value.kind(),
            enum_values: vec![value.clone()],
            default: Some(value),
            ..Self::default()
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    pub fn with_property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.properties.insert(name.into(), node);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    pub fn with_items(mut self, items: SchemaNode) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_enum(mut self, values: Vec<GeneratedValue>) -> Self {
        self.enum_values = values;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_default(mut self, value: GeneratedValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Longest path of nested properties/items below this node.
    pub fn depth(&self) -> usize {
        let children = self
            .properties
            .values()
            .map(SchemaNode::depth)
            .chain(self.items.iter().map(|items| items.depth()))
            .max();
        children.map(|depth| depth + 1).unwrap_or(0)
    }
}
