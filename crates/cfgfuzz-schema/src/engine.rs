use std::path::{Path, PathBuf};

use cfgfuzz_config::FuzzConfig;
use cfgfuzz_core::{GeneratedValue, SchemaNode};
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{Result, SchemaError};
use crate::source::SchemaSource;

/// How a schema was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    Explicit(PathBuf),
    Inferred(PathBuf),
}

/// Schema plus its provenance.
#[derive(Debug, Clone)]
pub struct DetectedSchema {
    pub root: SchemaNode,
    pub origin: SchemaOrigin,
}

/// Builds schema trees, applying the configuration overlay.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEngine<'a> {
    pub(crate) config: &'a FuzzConfig,
}

impl<'a> SchemaEngine<'a> {
    pub fn new(config: &'a FuzzConfig) -> Self {
        Self { config }
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    /// Load the explicit schema when possible, otherwise infer from the
    /// example document.
    pub fn detect_schema(&self, source: &SchemaSource) -> Result<DetectedSchema> {
        if let Some(schema_path) = &source.schema_path {
            match self.load_explicit_schema(schema_path) {
                Ok(root) => {
                    info!(event = "schema_loaded", path = %schema_path.display(), kind = %root.kind);
                    return Ok(DetectedSchema {
                        root,
                        origin: SchemaOrigin::Explicit(schema_path.clone()),
                    });
                }
                Err(err) => {
                    debug!(event = "schema_fallback", error = %err, "falling back to inference");
                }
            }
        }

        let root = self.infer_from_example(&source.example_path)?;
        info!(
            event = "schema_inferred",
            path = %source.example_path.display(),
            properties = root.properties.len()
        );
        Ok(DetectedSchema {
            root,
            origin: SchemaOrigin::Inferred(source.example_path.clone()),
        })
    }

    /// Parse a JSON Schema document from disk.
    pub fn load_explicit_schema(&self, path: &Path) -> Result<SchemaNode> {
        let data = std::fs::read_to_string(path).map_err(|err| SchemaError::load(path, err))?;
        let document: Value =
            serde_json::from_str(&data).map_err(|err| SchemaError::load(path, err))?;
        self.schema_from_document(&document)
            .map_err(|reason| SchemaError::load(path, reason))
    }

    /// Convert an in-memory JSON Schema document.
    pub fn schema_from_document(&self, document: &Value) -> std::result::Result<SchemaNode, String> {
        if !document.is_object() {
            return Err("schema document must be a JSON object".to_string());
        }
        JSONSchema::compile(document).map_err(|err| format!("invalid JSON Schema: {err}"))?;
        Ok(self.convert_json_schema(document, "", 0))
    }

    /// Parse an example YAML document from disk and infer its schema.
    pub fn infer_from_example(&self, path: &Path) -> Result<SchemaNode> {
        let data =
            std::fs::read_to_string(path).map_err(|err| SchemaError::inference(path, err))?;
        let document: serde_yaml::Value =
            serde_yaml::from_str(&data).map_err(|err| SchemaError::inference(path, err))?;

        match GeneratedValue::from_yaml(&document) {
            GeneratedValue::Null => Ok(self.infer_from_value(&GeneratedValue::empty_map())),
            value @ GeneratedValue::Map(_) => Ok(self.infer_from_value(&value)),
            other => Err(SchemaError::inference(
                path,
                format!("example root must be a mapping, found {}", other.kind()),
            )),
        }
    }

    /// Infer a schema from an in-memory example tree.
    pub fn infer_from_value(&self, value: &GeneratedValue) -> SchemaNode {
        self.infer_schema(value, "", 0)
    }
}
