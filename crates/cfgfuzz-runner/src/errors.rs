use std::path::PathBuf;

use thiserror::Error;

/// Failures while writing artifacts. Inside the fuzz loop these are logged
/// and the crash is still reported.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] cfgfuzz_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid artifact path {}", .0.display())]
    InvalidPath(PathBuf),
}
