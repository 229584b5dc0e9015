use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while acquiring a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The explicit schema document is missing or malformed. Recoverable:
    /// detection falls back to inference.
    #[error("failed to load schema {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    /// The example document is missing or unparsable. Fatal.
    #[error("failed to infer schema from {}: {reason}", path.display())]
    Inference { path: PathBuf, reason: String },
}

impl SchemaError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SchemaError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SchemaError::Inference {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
