use std::io::Write;
use std::time::{Duration, Instant};

use cfgfuzz_runner::{CrashRecord, RenderOutcome, SessionObserver, SessionReport};

/// Prints session progress for a terminal, or only crashes and the summary
/// in CI mode.
pub struct ConsoleReporter<W: Write> {
    writer: W,
    quiet: bool,
    target: String,
    started: Instant,
    iterations: u64,
    crashes: u64,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(writer: W, target: impl Into<String>, quiet: bool) -> Self {
        Self {
            writer,
            quiet,
            target: target.into(),
            started: Instant::now(),
            iterations: 0,
            crashes: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SessionObserver for ConsoleReporter<W> {
    fn on_start(&mut self, report: &SessionReport) {
        self.started = Instant::now();
        if self.quiet {
            return;
        }
        let _ = writeln!(self.writer, "cfgfuzz: starting fuzz session {}", report.session_id);
        let _ = writeln!(self.writer, "  target: {}", self.target);
        let _ = writeln!(self.writer, "  iterations: {}", report.iterations_requested);
        if let Some(seed) = report.seed {
            let _ = writeln!(self.writer, "  seed: {seed}");
        }
        let _ = writeln!(self.writer);
    }

    fn on_iteration(&mut self, iteration: u64, outcome: &RenderOutcome) {
        self.iterations = iteration;
        if !outcome.response.success && !outcome.response.is_unclassified() {
            self.crashes += 1;
        }
        if self.quiet {
            return;
        }
        let elapsed = self.started.elapsed();
        let rate = iteration as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        let _ = write!(
            self.writer,
            "\riterations: {} | failures: {} | rate: {:.1}/s | elapsed: {}",
            iteration,
            self.crashes,
            rate,
            format_duration(elapsed)
        );
        let _ = self.writer.flush();
    }

    fn on_crash(&mut self, record: &CrashRecord) {
        if !self.quiet {
            let _ = writeln!(self.writer, "\n");
        }
        let _ = writeln!(self.writer, "CRASH at iteration {}", record.iteration);
        let _ = writeln!(self.writer, "  reason: {}", record.reason);
        if let Some(path) = &record.artifact_path {
            let _ = writeln!(self.writer, "  reproduction: {}", path.display());
        }
        if !self.quiet {
            let _ = writeln!(self.writer);
        }
    }

    fn on_finish(&mut self, report: &SessionReport) {
        if !self.quiet {
            let _ = writeln!(self.writer, "\n");
        }
        let _ = writeln!(self.writer, "fuzz session completed");
        let _ = writeln!(self.writer, "  iterations: {}", report.iterations_run);
        let _ = writeln!(self.writer, "  crashes: {}", report.crashes);
        let _ = writeln!(self.writer, "  unique interesting: {}", report.unique_crashes.len());
        let _ = writeln!(self.writer, "  duplicates: {}", report.duplicates);
        if report.timed_out {
            let _ = writeln!(self.writer, "  stopped at the deadline");
        }
        let _ = writeln!(
            self.writer,
            "  duration: {}",
            format_duration(Duration::from_millis(report.duration_ms))
        );
        if report.found_interesting() {
            let _ = writeln!(
                self.writer,
                "\nfound {} crash(es); review the reproduction files",
                report.unique_crashes.len()
            );
        } else {
            let _ = writeln!(self.writer, "\nno interesting crashes found");
        }
        let _ = self.writer.flush();
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}
