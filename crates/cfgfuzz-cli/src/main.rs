mod commands;
mod duration;
mod logging;
mod renderer;
mod reporter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use cfgfuzz_config::ConfigError;
use cfgfuzz_schema::SchemaError;
use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::duration::parse_duration;

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "cfgfuzz", version, about = "Schema-driven configuration fuzzer")]
struct Cli {
    /// Log at info level on stderr (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    /// Append JSON log lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate configurations and render each one, recording crashes.
    Fuzz(FuzzArgs),
    /// Render a saved reproduction file once and classify the result.
    Replay(ReplayArgs),
    /// Print the detected schema as JSON.
    Schema(SchemaArgs),
    /// Print the JSON Schema of the configuration file.
    ConfigSchema,
}

#[derive(Args, Debug)]
struct FuzzArgs {
    /// Directory with values.schema.json and/or values.yaml, or an example values file.
    target: PathBuf,
    /// Only print crashes and the summary.
    #[arg(long, default_value_t = false)]
    ci: bool,
    /// Session time budget: whole numbers with ms, s, m, h or d units, combinable (e.g. 90s, 1h30m).
    #[arg(long, default_value = "5m", value_parser = parse_duration)]
    timeout: Duration,
    /// Iteration bound; 0 keeps the configured value.
    #[arg(long)]
    iterations: Option<u64>,
    /// Directory for reproduction files and the session report.
    #[arg(long, default_value = ".")]
    output: PathBuf,
    /// Seed for the value generator.
    #[arg(long)]
    seed: Option<u64>,
    /// Configuration file instead of the one in the target directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Save crashes as found, without shrinking.
    #[arg(long, default_value_t = false)]
    no_minimize: bool,
    /// Render command; `{values}` is replaced by the candidate file.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Reproduction file written by `fuzz`.
    file: PathBuf,
    /// Configuration file supplying ignoreErrors and uninterestingPatterns.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Render command; `{values}` is replaced by the reproduction file.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    target: PathBuf,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean,
    Interesting,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::Interesting => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            tracing::error!(event = "command_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    logging::init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Command::Fuzz(args) => commands::run_fuzz(args),
        Command::Replay(args) => commands::run_replay(args),
        Command::Schema(args) => commands::run_schema(args),
        Command::ConfigSchema => commands::run_config_schema(),
    }
}
