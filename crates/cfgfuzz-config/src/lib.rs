//! User configuration for cfgfuzz sessions.
//!
//! Covers the configuration document model, YAML/TOML loading, structural
//! validation against the generated JSON Schema, and semantic checks.

pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, ValidationIssue, ValidationReport};
pub use load::{CONFIG_FILE_NAMES, ConfigFormat, LoadedConfig, load_config, load_config_file, parse_config_str};
pub use model::{DEFAULT_ITERATIONS, DEFAULT_MAX_DEPTH, FuzzConfig, PathConstraint};
pub use schema::config_json_schema;
pub use validate::{ValidatedConfig, validate_config, validate_config_json, validate_config_semantics};
