use std::path::{Path, PathBuf};

use cfgfuzz_core::GeneratedValue;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::atomic::write_bytes_atomic;
use crate::errors::PersistenceError;

pub const ARTIFACT_PREFIX: &str = "fuzzer-repro-";
pub const DEFAULT_HINT: &str = "cfgfuzz replay {file} -- <render command>";

/// Persists crashing inputs as content-addressed YAML files.
#[derive(Debug, Clone)]
pub struct ReproductionWriter {
    output_dir: PathBuf,
    hint: String,
}

impl ReproductionWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            hint: DEFAULT_HINT.to_string(),
        }
    }

    /// Reproduction command shown in the header; `{file}` is replaced by the
    /// artifact file name.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File name the value would be saved under.
    pub fn artifact_name(&self, value: &GeneratedValue) -> Result<String, PersistenceError> {
        let body = value.to_yaml_string()?;
        Ok(artifact_name_for(&body))
    }

    /// Write `value` with a provenance header. Saving the same value again
    /// overwrites the same file.
    pub fn save_reproduction(
        &self,
        value: &GeneratedValue,
        reason: &str,
    ) -> Result<PathBuf, PersistenceError> {
        let body = value.to_yaml_string()?;
        let file_name = artifact_name_for(&body);
        let path = self.output_dir.join(&file_name);

        let mut content = String::from("# cfgfuzz reproduction case\n");
        let mut lines = reason.lines();
        content.push_str(&format!("# Crash reason: {}\n", lines.next().unwrap_or_default()));
        for line in lines {
            content.push_str(&format!("#   {line}\n"));
        }
        content.push_str(&format!(
            "# To reproduce: {}\n\n",
            self.hint.replace("{file}", &file_name)
        ));
        content.push_str(&body);

        write_bytes_atomic(&path, content.as_bytes())?;
        debug!(event = "artifact_written", path = %path.display(), bytes = content.len());
        Ok(path)
    }
}

fn artifact_name_for(body: &str) -> String {
    let digest = hex::encode(Sha256::digest(body.as_bytes()));
    format!("{ARTIFACT_PREFIX}{}.yaml", &digest[..8])
}
