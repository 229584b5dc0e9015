use std::io;
use std::path::{Path, PathBuf};

use cfgfuzz_config::{FuzzConfig, LoadedConfig, config_json_schema, load_config, load_config_file};
use cfgfuzz_core::GeneratedValue;
use cfgfuzz_generate::{RngDraw, ValueGenerator};
use cfgfuzz_runner::atomic::write_json_atomic;
use cfgfuzz_runner::{
    Deduplicator, FuzzSession, Oracle, ReproductionWriter, SessionOptions, render_guarded,
};
use cfgfuzz_schema::{DetectedSchema, SchemaEngine, SchemaOrigin, SchemaSource};
use tracing::{info, warn};

use crate::renderer::CommandRenderer;
use crate::reporter::ConsoleReporter;
use crate::{CliError, FuzzArgs, Outcome, ReplayArgs, SchemaArgs};

/// Session summary written next to the reproduction files.
pub const SESSION_REPORT_FILE: &str = "session_report.json";

pub fn run_fuzz(args: FuzzArgs) -> Result<Outcome, CliError> {
    let mut config = resolve_config(&args.target, args.config.as_deref())?;
    if let Some(iterations) = args.iterations.filter(|iterations| *iterations > 0) {
        config.iterations = iterations;
    }

    let detected = detect(&args.target, &config)?;

    let mut renderer = CommandRenderer::new(&args.command)?;
    renderer.preflight()?;

    let mut draw = match args.seed.or(config.seed) {
        Some(seed) => RngDraw::seeded(seed),
        None => RngDraw::from_entropy(),
    };

    let options = SessionOptions {
        iterations: config.iterations,
        timeout: Some(args.timeout),
        minimize: !args.no_minimize,
        seed: Some(draw.seed()),
        ..SessionOptions::default()
    };
    let writer = ReproductionWriter::new(&args.output).with_hint(renderer.hint());
    let mut session = FuzzSession::new(
        ValueGenerator::new(config.max_depth),
        Oracle::from_config(&config),
        writer,
        options,
    );

    let mut reporter =
        ConsoleReporter::new(io::stdout(), args.target.display().to_string(), args.ci);
    let report = session.run(&detected.root, &mut draw, &mut renderer, &mut reporter);

    // The crash records are already on the console; a lost report must not
    // mask the exit status.
    let report_path = args.output.join(SESSION_REPORT_FILE);
    match write_json_atomic(&report_path, &report) {
        Ok(()) => info!(event = "report_written", path = %report_path.display()),
        Err(err) => warn!(event = "report_failed", path = %report_path.display(), error = %err),
    }

    Ok(if report.found_interesting() {
        Outcome::Interesting
    } else {
        Outcome::Clean
    })
}

pub fn run_replay(args: ReplayArgs) -> Result<Outcome, CliError> {
    let oracle = match &args.config {
        Some(path) => Oracle::from_config(&checked(load_config_file(path)?)),
        None => Oracle::new(),
    };

    let contents = std::fs::read_to_string(&args.file)?;
    let document: serde_yaml::Value = serde_yaml::from_str(&contents)?;
    let value = GeneratedValue::from_yaml(&document);

    let mut renderer = CommandRenderer::new(&args.command)?;
    renderer.preflight()?;
    let outcome = render_guarded(&mut renderer, value);
    let response = &outcome.response;

    println!("replayed {}", args.file.display());
    let interesting = oracle.is_interesting(response);
    let verdict = if response.success {
        "success"
    } else if interesting {
        "interesting crash"
    } else if oracle.is_crash(response) {
        "uninteresting crash"
    } else if response.is_unclassified() {
        "unclassified"
    } else {
        "ignored error"
    };
    println!("  result: {verdict}");
    if !response.success {
        let reason = oracle.describe_reason(response);
        println!("  reason: {reason}");
        println!("  fingerprint: {}", Deduplicator::new().fingerprint(&reason));
    }
    info!(event = "replay_finished", file = %args.file.display(), verdict);

    Ok(if interesting {
        Outcome::Interesting
    } else {
        Outcome::Clean
    })
}

pub fn run_schema(args: SchemaArgs) -> Result<Outcome, CliError> {
    let config = resolve_config(&args.target, args.config.as_deref())?;
    let detected = detect(&args.target, &config)?;
    println!("{}", serde_json::to_string_pretty(&detected.root)?);
    Ok(Outcome::Clean)
}

pub fn run_config_schema() -> Result<Outcome, CliError> {
    println!("{}", serde_json::to_string_pretty(&config_json_schema())?);
    Ok(Outcome::Clean)
}

/// `--config` wins; otherwise look next to the target.
fn resolve_config(target: &Path, explicit: Option<&Path>) -> Result<FuzzConfig, CliError> {
    if !target.exists() {
        return Err(CliError::InvalidArgs(format!(
            "target does not exist: {}",
            target.display()
        )));
    }

    let loaded = match explicit {
        Some(path) => load_config_file(path)?,
        None => load_config(&config_dir(target))?,
    };
    match &loaded.source {
        Some(path) => info!(event = "config_loaded", path = %path.display()),
        None => info!(event = "config_defaults"),
    }
    Ok(checked(loaded))
}

fn config_dir(target: &Path) -> PathBuf {
    if target.is_dir() {
        return target.to_path_buf();
    }
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn checked(loaded: LoadedConfig) -> FuzzConfig {
    for issue in &loaded.warnings {
        warn!(
            event = "config_warning",
            code = %issue.code,
            path = %issue.path,
            message = %issue.message,
            hint = issue.hint.as_deref().unwrap_or("")
        );
    }
    loaded.config
}

fn detect(target: &Path, config: &FuzzConfig) -> Result<DetectedSchema, CliError> {
    let source = if target.is_file() {
        SchemaSource::example_only(target)
    } else {
        SchemaSource::from_dir(target)
    };
    let detected = SchemaEngine::new(config).detect_schema(&source)?;
    match &detected.origin {
        SchemaOrigin::Explicit(path) => info!(event = "schema_detected", mode = "explicit", path = %path.display()),
        SchemaOrigin::Inferred(path) => info!(event = "schema_detected", mode = "inferred", path = %path.display()),
    }
    Ok(detected)
}
