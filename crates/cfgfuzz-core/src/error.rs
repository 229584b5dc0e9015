use thiserror::Error;

/// Core error type shared across cfgfuzz crates.
#[derive(Debug, Error)]
pub enum Error {
    /// YAML serialization or parsing failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A value cannot be represented in the target form.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Convenience alias for results returned by cfgfuzz crates.
pub type Result<T> = std::result::Result<T, Error>;
