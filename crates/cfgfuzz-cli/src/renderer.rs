use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use cfgfuzz_core::GeneratedValue;
use cfgfuzz_runner::{FaultPayload, RenderResponse, Renderer};
use tempfile::TempDir;
use tracing::warn;

use crate::CliError;

/// Replaced by the path of the candidate values file.
pub const VALUES_PLACEHOLDER: &str = "{values}";

/// Renders candidates by running an external command against a temporary
/// values file. A non-zero exit is an error; death by signal is a fault.
#[derive(Debug)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    workdir: TempDir,
}

impl CommandRenderer {
    pub fn new(command: &[String]) -> Result<Self, CliError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CliError::InvalidArgs("a render command is required after --".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            workdir: tempfile::tempdir()?,
        })
    }

    pub fn values_path(&self) -> PathBuf {
        self.workdir.path().join("values.yaml")
    }

    /// Command line for a given values file.
    pub fn command_line(&self, values: &Path) -> Vec<String> {
        let values = values.display().to_string();
        let mut line = vec![self.program.clone()];
        let mut substituted = false;
        for arg in &self.args {
            if arg.contains(VALUES_PLACEHOLDER) {
                substituted = true;
                line.push(arg.replace(VALUES_PLACEHOLDER, &values));
            } else {
                line.push(arg.clone());
            }
        }
        if !substituted {
            line.push("-f".to_string());
            line.push(values);
        }
        line
    }

    /// Reproduction hint for artifact headers.
    pub fn hint(&self) -> String {
        self.command_line(Path::new("{file}")).join(" ")
    }

    /// Check that the command can be started at all, so a typo fails the
    /// run up front instead of surfacing as a crash on every iteration.
    pub fn preflight(&self) -> Result<(), CliError> {
        self.execute(&GeneratedValue::empty_map())
            .map(|_| ())
            .map_err(|err| CliError::InvalidArgs(format!("cannot run `{}`: {err}", self.program)))
    }

    fn execute(&self, values: &GeneratedValue) -> std::io::Result<Output> {
        let yaml = values.to_yaml_string().map_err(std::io::Error::other)?;
        let path = self.values_path();
        std::fs::write(&path, yaml)?;

        let line = self.command_line(&path);
        Command::new(&line[0])
            .args(&line[1..])
            .stdin(Stdio::null())
            .output()
    }
}

impl Renderer for CommandRenderer {
    fn render(&mut self, values: &GeneratedValue) -> RenderResponse {
        match self.execute(values) {
            Ok(output) => response_from_output(&output),
            Err(err) => {
                // Not the target's fault; keep it out of the crash list.
                warn!(event = "render_command_failed", program = %self.program, error = %err);
                RenderResponse::unclassified()
            }
        }
    }
}

fn response_from_output(output: &Output) -> RenderResponse {
    if output.status.success() {
        return RenderResponse::ok();
    }
    if let Some(signal) = terminating_signal(&output.status) {
        return RenderResponse::fault(FaultPayload::Text(format!(
            "terminated by signal {signal}"
        )));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else if !stdout.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        format!("command exited with {}", output.status)
    };
    RenderResponse::error(text)
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
