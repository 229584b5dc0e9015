use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{ConfigError, Result, ValidationIssue};
use crate::model::FuzzConfig;
use crate::validate::validate_config;

/// File names probed, in order, inside a target directory.
pub const CONFIG_FILE_NAMES: &[&str] = &[".cfgfuzz.yaml", ".cfgfuzz.yml", ".cfgfuzz.toml"];

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything but `.toml` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Configuration plus where it came from and what validation flagged.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: FuzzConfig,
    /// `None` when no configuration file exists and defaults are used.
    pub source: Option<PathBuf>,
    pub warnings: Vec<ValidationIssue>,
}

/// Load the configuration stored in `dir`, or defaults when there is none.
pub fn load_config(dir: &Path) -> Result<LoadedConfig> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if path.is_file() {
            return load_config_file(&path);
        }
    }

    Ok(LoadedConfig {
        config: FuzzConfig::default(),
        source: None,
        warnings: Vec::new(),
    })
}

/// Load and validate a specific configuration file.
pub fn load_config_file(path: &Path) -> Result<LoadedConfig> {
    let contents = std::fs::read_to_string(path)?;
    let (config, warnings) =
        parse_config_str(&contents, ConfigFormat::from_path(path)).map_err(|err| match err {
            ConfigError::Invalid { report, .. } => ConfigError::Invalid {
                path: path.to_path_buf(),
                report,
            },
            other => other,
        })?;

    Ok(LoadedConfig {
        config,
        source: Some(path.to_path_buf()),
        warnings,
    })
}

/// Parse and validate configuration text.
pub fn parse_config_str(
    contents: &str,
    format: ConfigFormat,
) -> Result<(FuzzConfig, Vec<ValidationIssue>)> {
    let document: Value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    // An empty YAML document parses as null.
    let document = if document.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        document
    };

    let validated = validate_config(&document).map_err(|report| ConfigError::Invalid {
        path: PathBuf::new(),
        report,
    })?;
    Ok((validated.config, validated.warnings))
}
