use std::path::PathBuf;
use std::time::Duration;

use cfgfuzz_config::DEFAULT_ITERATIONS;
use cfgfuzz_core::GeneratedValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::minimize::DEFAULT_MAX_ATTEMPTS;
use crate::render::RenderResponse;

/// Options for one fuzz session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Upper bound on iterations.
    pub iterations: u64,
    /// Wall-clock budget, checked between iterations.
    pub timeout: Option<Duration>,
    /// Shrink interesting crashes before saving them.
    pub minimize: bool,
    /// Candidate budget for each shrink.
    pub max_shrink_attempts: usize,
    /// Seed of the draw source, recorded in the report.
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            timeout: None,
            minimize: true,
            max_shrink_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }
}

/// A unique interesting crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashRecord {
    pub iteration: u64,
    pub reason: String,
    pub fingerprint: String,
    /// Input that reproduces the crash, minimized when enabled.
    pub value: GeneratedValue,
    pub response: RenderResponse,
    pub minimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
}

/// Summary of a fuzz session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub iterations_requested: u64,
    pub iterations_run: u64,
    /// Every crashing iteration, duplicates included.
    pub crashes: u64,
    pub interesting: u64,
    /// Crashes matching an uninteresting pattern.
    pub uninteresting: u64,
    /// Interesting crashes whose fingerprint was already recorded.
    pub duplicates: u64,
    /// Errors dropped by the ignore list.
    pub ignored: u64,
    /// Responses with neither success, error nor fault.
    pub unclassified: u64,
    pub artifact_failures: u64,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub unique_crashes: Vec<CrashRecord>,
}

impl SessionReport {
    pub fn new(options: &SessionOptions) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            seed: options.seed,
            iterations_requested: options.iterations,
            iterations_run: 0,
            crashes: 0,
            interesting: 0,
            uninteresting: 0,
            duplicates: 0,
            ignored: 0,
            unclassified: 0,
            artifact_failures: 0,
            timed_out: false,
            duration_ms: 0,
            unique_crashes: Vec::new(),
        }
    }

    /// Whether the session found anything worth a non-zero exit.
    pub fn found_interesting(&self) -> bool {
        !self.unique_crashes.is_empty()
    }
}
