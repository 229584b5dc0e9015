use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::FuzzConfig;

/// Emit the JSON Schema for `.cfgfuzz.yaml`.
pub fn config_json_schema() -> RootSchema {
    schema_for!(FuzzConfig)
}
