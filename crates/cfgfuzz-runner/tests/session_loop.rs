use std::time::Duration;

use cfgfuzz_config::FuzzConfig;
use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};
use cfgfuzz_generate::{RngDraw, ValueGenerator};
use cfgfuzz_runner::{
    CrashRecord, FuzzSession, Oracle, RenderOutcome, RenderResponse, ReproductionWriter,
    SessionObserver, SessionOptions, SessionReport,
};

fn chart_schema() -> SchemaNode {
    SchemaNode::new(SchemaKind::Object)
        .with_property(
            "replicaCount",
            SchemaNode::new(SchemaKind::Integer).with_range(Some(0.0), Some(10.0)),
        )
        .with_property("name", SchemaNode::new(SchemaKind::String).with_length(Some(1), Some(8)))
        .with_property("debug", SchemaNode::new(SchemaKind::Boolean))
        .with_required("replicaCount")
}

fn replicas(values: &GeneratedValue) -> i64 {
    values
        .as_map()
        .and_then(|map| map.get("replicaCount"))
        .and_then(GeneratedValue::as_i64)
        .unwrap_or_default()
}

fn session(dir: &std::path::Path, options: SessionOptions) -> FuzzSession {
    FuzzSession::new(
        ValueGenerator::new(5),
        Oracle::new(),
        ReproductionWriter::new(dir),
        options,
    )
}

fn options(iterations: u64) -> SessionOptions {
    SessionOptions {
        iterations,
        seed: Some(11),
        ..SessionOptions::default()
    }
}

#[test]
fn duplicate_crashes_collapse_to_one_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(dir.path(), options(300));
    // Same failure site, different positions in the message.
    let mut renderer = |values: &GeneratedValue| {
        let count = replicas(values);
        if count > 5 {
            RenderResponse::error(format!(
                "template: deployment.yaml:{}:3: replica count too high",
                count * 7
            ))
        } else {
            RenderResponse::ok()
        }
    };

    let schema = chart_schema().with_required("name").with_required("debug");
    let report = session.run(&schema, &mut RngDraw::seeded(11), &mut renderer, &mut ());

    assert_eq!(report.iterations_run, 300);
    assert_eq!(report.unique_crashes.len(), 1);
    assert!(report.crashes > 1);
    assert_eq!(report.interesting, report.crashes);
    assert_eq!(report.duplicates, report.interesting - 1);
    assert_eq!(report.seed, Some(11));
    assert!(report.found_interesting());

    let record = &report.unique_crashes[0];
    assert!(record.reason.starts_with("Error: template: deployment.yaml:"));
    assert_eq!(record.fingerprint.len(), 64);
    // Shrinking keeps required keys and the trigger.
    let map = record.value.as_map().expect("map");
    assert_eq!(map.len(), 3);
    assert!(map.contains_key("name"));
    assert!(map.contains_key("debug"));
    assert!(replicas(&record.value) > 5);
    assert!(record.minimized);
    // The stored response belongs to the stored value.
    assert_eq!(
        record.response.error_text.as_deref(),
        Some(
            format!(
                "template: deployment.yaml:{}:3: replica count too high",
                replicas(&record.value) * 7
            )
            .as_str()
        )
    );

    let artifact = record.artifact_path.as_ref().expect("artifact saved");
    assert!(artifact.starts_with(dir.path()));
    let content = std::fs::read_to_string(artifact).expect("read artifact");
    assert!(content.contains("# Crash reason: Error: template: deployment.yaml:"));
}

#[test]
fn panics_are_captured_and_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(dir.path(), options(50));
    let mut renderer = |values: &GeneratedValue| -> RenderResponse {
        if replicas(values) < 3 {
            panic!("too few replicas");
        }
        RenderResponse::ok()
    };

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(3), &mut renderer, &mut ());

    assert_eq!(report.iterations_run, 50);
    assert_eq!(report.unique_crashes.len(), 1);
    assert_eq!(
        report.unique_crashes[0].reason,
        "Panic: too few replicas"
    );
}

#[test]
fn minimized_crashes_still_satisfy_the_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(dir.path(), options(1));
    let schema = SchemaNode::new(SchemaKind::Object)
        .with_property(
            "replicaCount",
            SchemaNode::new(SchemaKind::Integer).with_range(Some(1.0), Some(10.0)),
        )
        .with_property(
            "pullPolicy",
            SchemaNode::new(SchemaKind::String).with_enum(vec![
                GeneratedValue::from("Always"),
                GeneratedValue::from("Never"),
            ]),
        )
        .with_property("debug", SchemaNode::new(SchemaKind::Boolean))
        .with_required("replicaCount")
        .with_required("pullPolicy");
    let mut renderer = |_: &GeneratedValue| RenderResponse::error("chart is broken");

    let report = session.run(&schema, &mut RngDraw::seeded(4), &mut renderer, &mut ());

    let record = &report.unique_crashes[0];
    let map = record.value.as_map().expect("map");
    assert_eq!(map.get("replicaCount"), Some(&GeneratedValue::Integer(1)));
    assert_eq!(map.get("pullPolicy"), Some(&GeneratedValue::from("Always")));
    assert!(!map.contains_key("debug"));
}

#[test]
fn uninteresting_and_ignored_errors_are_counted_not_recorded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = FuzzConfig {
        ignore_errors: vec!["connection refused".to_string()],
        ..FuzzConfig::default()
    };
    let mut session = FuzzSession::new(
        ValueGenerator::new(5),
        Oracle::from_config(&config),
        ReproductionWriter::new(dir.path()),
        options(100),
    );
    let mut renderer = |values: &GeneratedValue| {
        if replicas(values) % 2 == 0 {
            RenderResponse::error("validation failed: replicaCount must be odd")
        } else {
            RenderResponse::error("dial tcp: connection refused")
        }
    };

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(5), &mut renderer, &mut ());

    assert!(!report.found_interesting());
    assert_eq!(report.interesting, 0);
    assert_eq!(report.crashes, report.uninteresting);
    assert_eq!(report.crashes + report.ignored, 100);
    assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
}

#[test]
fn unclassified_outcomes_are_not_crashes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(dir.path(), options(20));
    let mut renderer = |_: &GeneratedValue| RenderResponse::unclassified();

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(1), &mut renderer, &mut ());

    assert_eq!(report.unclassified, 20);
    assert_eq!(report.crashes, 0);
}

#[test]
fn expired_deadline_stops_before_the_first_iteration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(
        dir.path(),
        SessionOptions {
            timeout: Some(Duration::ZERO),
            ..options(1000)
        },
    );
    let mut renderer = |_: &GeneratedValue| RenderResponse::error("boom");

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(1), &mut renderer, &mut ());

    assert!(report.timed_out);
    assert_eq!(report.iterations_run, 0);
    assert!(report.unique_crashes.is_empty());
}

#[test]
fn deadline_keeps_records_collected_so_far() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(
        dir.path(),
        SessionOptions {
            timeout: Some(Duration::from_millis(50)),
            minimize: false,
            ..options(u64::MAX)
        },
    );
    let mut renderer = |_: &GeneratedValue| {
        std::thread::sleep(Duration::from_millis(5));
        RenderResponse::error("boom")
    };

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(1), &mut renderer, &mut ());

    assert!(report.timed_out);
    assert!(report.iterations_run >= 1);
    assert_eq!(report.unique_crashes.len(), 1);
    assert_eq!(report.duplicates, report.iterations_run - 1);
}

#[test]
fn artifact_failures_still_report_the_crash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").expect("write blocker");
    let mut session = session(&blocker, options(5));
    let mut renderer = |_: &GeneratedValue| RenderResponse::error("boom");

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(1), &mut renderer, &mut ());

    assert_eq!(report.unique_crashes.len(), 1);
    assert_eq!(report.artifact_failures, 1);
    assert!(report.unique_crashes[0].artifact_path.is_none());
}

#[derive(Default)]
struct Recorder {
    started: bool,
    iterations: Vec<u64>,
    crashes: Vec<String>,
    finished: Option<u64>,
}

impl SessionObserver for Recorder {
    fn on_start(&mut self, _report: &SessionReport) {
        self.started = true;
    }

    fn on_iteration(&mut self, iteration: u64, _outcome: &RenderOutcome) {
        self.iterations.push(iteration);
    }

    fn on_crash(&mut self, record: &CrashRecord) {
        self.crashes.push(record.reason.clone());
    }

    fn on_finish(&mut self, report: &SessionReport) {
        self.finished = Some(report.iterations_run);
    }
}

#[test]
fn observer_sees_every_phase() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(
        dir.path(),
        SessionOptions {
            minimize: false,
            ..options(10)
        },
    );
    let mut renderer = |_: &GeneratedValue| RenderResponse::error("always broken");
    let mut recorder = Recorder::default();

    session.run(&chart_schema(), &mut RngDraw::seeded(9), &mut renderer, &mut recorder);

    assert!(recorder.started);
    assert_eq!(recorder.iterations, (1..=10).collect::<Vec<_>>());
    assert_eq!(recorder.crashes, vec!["Error: always broken".to_string()]);
    assert_eq!(recorder.finished, Some(10));
}

#[test]
fn report_serializes_to_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(dir.path(), options(3));
    let mut renderer = |_: &GeneratedValue| RenderResponse::error("boom");

    let report = session.run(&chart_schema(), &mut RngDraw::seeded(2), &mut renderer, &mut ());
    let json = serde_json::to_value(&report).expect("serialize");

    assert_eq!(json["iterations_run"], 3);
    assert_eq!(json["unique_crashes"][0]["reason"], "Error: boom");
    assert_eq!(json["unique_crashes"][0]["response"]["error_text"], "boom");
}
