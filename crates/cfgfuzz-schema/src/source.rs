use std::path::{Path, PathBuf};

/// Conventional name of the explicit schema document.
pub const DEFAULT_SCHEMA_FILE: &str = "values.schema.json";
/// Conventional name of the example configuration document.
pub const DEFAULT_EXAMPLE_FILE: &str = "values.yaml";

/// Where schema detection looks for its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// Explicit JSON Schema document, tried first.
    pub schema_path: Option<PathBuf>,
    /// Example configuration used for inference.
    pub example_path: PathBuf,
}

impl SchemaSource {
    /// Use the conventional file names inside `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            schema_path: Some(dir.join(DEFAULT_SCHEMA_FILE)),
            example_path: dir.join(DEFAULT_EXAMPLE_FILE),
        }
    }

    /// Inference only, skipping any explicit schema.
    pub fn example_only(path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: None,
            example_path: path.into(),
        }
    }
}
