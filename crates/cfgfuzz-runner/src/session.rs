use std::time::Instant;

use cfgfuzz_core::{GeneratedValue, SchemaNode};
use cfgfuzz_generate::{Draw, ValueGenerator};
use tracing::{debug, info, warn};

use crate::dedup::Deduplicator;
use crate::minimize::{Minimized, Minimizer};
use crate::model::{CrashRecord, SessionOptions, SessionReport};
use crate::oracle::Oracle;
use crate::render::{QuietPanics, RenderOutcome, RenderResponse, Renderer, render_guarded};
use crate::repro::ReproductionWriter;

/// Progress callbacks for a running session. All methods default to no-ops.
pub trait SessionObserver {
    fn on_start(&mut self, _report: &SessionReport) {}
    fn on_iteration(&mut self, _iteration: u64, _outcome: &RenderOutcome) {}
    fn on_crash(&mut self, _record: &CrashRecord) {}
    fn on_finish(&mut self, _report: &SessionReport) {}
}

impl SessionObserver for () {}

/// The generate, render, classify and persist loop.
#[derive(Debug)]
pub struct FuzzSession {
    generator: ValueGenerator,
    oracle: Oracle,
    dedup: Deduplicator,
    writer: ReproductionWriter,
    options: SessionOptions,
}

impl FuzzSession {
    pub fn new(
        generator: ValueGenerator,
        oracle: Oracle,
        writer: ReproductionWriter,
        options: SessionOptions,
    ) -> Self {
        Self {
            generator,
            oracle,
            dedup: Deduplicator::new(),
            writer,
            options,
        }
    }

    /// Run iterations until the iteration bound or the deadline. Failures
    /// inside the loop never abort it.
    pub fn run<D, R, O>(
        &mut self,
        schema: &SchemaNode,
        draw: &mut D,
        renderer: &mut R,
        observer: &mut O,
    ) -> SessionReport
    where
        D: Draw + ?Sized,
        R: Renderer + ?Sized,
        O: SessionObserver + ?Sized,
    {
        let _quiet = QuietPanics::install();
        let started = Instant::now();
        let deadline = self.options.timeout.map(|timeout| started + timeout);
        let mut report = SessionReport::new(&self.options);

        info!(
            event = "session_started",
            session_id = %report.session_id,
            iterations = self.options.iterations,
            timeout_ms = self.options.timeout.map(|timeout| timeout.as_millis() as u64),
            seed = self.options.seed,
            max_depth = self.generator.max_depth()
        );
        observer.on_start(&report);

        for iteration in 1..=self.options.iterations {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                report.timed_out = true;
                info!(event = "session_deadline", iteration, "deadline reached");
                break;
            }

            let value = self.generator.generate(schema, draw);
            let outcome = render_guarded(renderer, value);
            report.iterations_run += 1;
            observer.on_iteration(iteration, &outcome);

            if let Some(record) = self.classify(schema, iteration, outcome, renderer, &mut report) {
                observer.on_crash(&record);
                report.unique_crashes.push(record);
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            event = "session_finished",
            session_id = %report.session_id,
            iterations = report.iterations_run,
            crashes = report.crashes,
            unique = report.unique_crashes.len(),
            duplicates = report.duplicates,
            timed_out = report.timed_out,
            duration_ms = report.duration_ms
        );
        observer.on_finish(&report);
        report
    }

    /// Update counters for one outcome and build a record when it is a new
    /// interesting crash.
    fn classify<R: Renderer + ?Sized>(
        &mut self,
        schema: &SchemaNode,
        iteration: u64,
        outcome: RenderOutcome,
        renderer: &mut R,
        report: &mut SessionReport,
    ) -> Option<CrashRecord> {
        let response = &outcome.response;
        if !self.oracle.is_crash(response) {
            if response.is_unclassified() {
                report.unclassified += 1;
                warn!(
                    event = "unclassified_outcome",
                    iteration, "renderer reported neither success, error nor fault"
                );
            } else if self.oracle.is_ignored(response) {
                report.ignored += 1;
            }
            return None;
        }

        report.crashes += 1;
        if !self.oracle.is_interesting(response) {
            report.uninteresting += 1;
            debug!(event = "crash_uninteresting", iteration);
            return None;
        }
        report.interesting += 1;

        let reason = self.oracle.describe_reason(response);
        let fingerprint = self.dedup.fingerprint(&reason);
        if !self.dedup.mark_seen(&reason) {
            report.duplicates += 1;
            debug!(event = "crash_duplicate", iteration, fingerprint = %fingerprint);
            return None;
        }
        info!(event = "crash_found", iteration, fingerprint = %fingerprint, reason = %reason);

        let RenderOutcome { value, response } = outcome;
        let (value, response, minimized) = if self.options.minimize {
            let (minimized, shrunk_response) = self.shrink(schema, value, &fingerprint, renderer);
            match shrunk_response {
                Some(shrunk_response) => (minimized.value, shrunk_response, true),
                None => (minimized.value, response, false),
            }
        } else {
            (value, response, false)
        };

        let artifact_path = match self.writer.save_reproduction(&value, &reason) {
            Ok(path) => {
                info!(event = "artifact_saved", iteration, path = %path.display());
                Some(path)
            }
            Err(err) => {
                report.artifact_failures += 1;
                warn!(event = "artifact_failed", iteration, error = %err);
                None
            }
        };

        Some(CrashRecord {
            iteration,
            reason,
            fingerprint,
            value,
            response,
            minimized,
            artifact_path,
        })
    }

    /// Shrink a crashing input. Also returns the response of the last
    /// adopted candidate, which is the one the shrunk value produced.
    fn shrink<R: Renderer + ?Sized>(
        &self,
        schema: &SchemaNode,
        value: GeneratedValue,
        fingerprint: &str,
        renderer: &mut R,
    ) -> (Minimized, Option<RenderResponse>) {
        let oracle = &self.oracle;
        let dedup = &self.dedup;
        let mut adopted = None;
        let minimizer = Minimizer::new(self.options.max_shrink_attempts);
        let minimized = minimizer.minimize(schema, value, |candidate| {
            let outcome = render_guarded(renderer, candidate.clone());
            let same_crash = oracle.is_interesting(&outcome.response)
                && dedup.fingerprint(&oracle.describe_reason(&outcome.response)) == fingerprint;
            if same_crash {
                adopted = Some(outcome.response);
            }
            same_crash
        });
        debug!(
            event = "crash_minimized",
            attempts = minimized.attempts,
            accepted = minimized.accepted
        );
        (minimized, adopted)
    }
}
