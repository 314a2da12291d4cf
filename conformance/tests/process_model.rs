//! Process adapter tests against the `reference-model` binary.
//!
//! Each vector runs in its own child process; these tests cover the native
//! and fallback time paths, a hung implementation, and one that crashes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;

use conformance::core::model::{ModelError, ModelFactory};
use conformance::core::outcome::TestStatus;
use conformance::core::vector::VectorSuite;
use conformance::io::process::{ProcessModelFactory, ProcessSpec};
use conformance::io::vector_store::load_vectors;
use conformance::suite::run_suite;
use conformance::test_support::{suite_json, vector_entry};

fn fixture_vectors() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vectors.json")
}

fn reference_spec(args: &[&str], timeout: Duration) -> ProcessSpec {
    ProcessSpec {
        program: PathBuf::from(env!("CARGO_BIN_EXE_reference-model")),
        args: args.iter().map(|arg| (*arg).to_string()).collect(),
        vector_timeout: timeout,
    }
}

fn run_fixture(args: &[&str]) -> Vec<(String, TestStatus, Option<String>)> {
    let loaded = load_vectors(&fixture_vectors()).expect("load fixture");
    let factory =
        ProcessModelFactory::probe(reference_spec(args, Duration::from_secs(10))).expect("probe");
    run_suite(&factory, &loaded.suite, |_| {})
        .into_iter()
        .map(|result| (result.id, result.status, result.message))
        .collect()
}

#[test]
fn probe_reads_self_description() {
    let factory = ProcessModelFactory::probe(reference_spec(&[], Duration::from_secs(10)))
        .expect("probe");
    let info = factory.info();
    assert_eq!(info.name, "reference-model");
    assert_eq!(info.language, "Rust");
    assert_eq!(info.license.as_deref(), Some("MIT"));
}

#[test]
fn fixture_passes_with_native_advance_time() {
    let results = run_fixture(&[]);
    assert_eq!(results.len(), 5);
    for (id, status, message) in &results {
        assert_eq!(*status, TestStatus::Passed, "{id}: {message:?}");
    }
}

#[test]
fn fixture_passes_with_decay_fallback() {
    let results = run_fixture(&["--without-advance-time"]);
    for (id, status, message) in &results {
        assert_eq!(*status, TestStatus::Passed, "{id}: {message:?}");
    }
}

#[test]
fn implementation_error_message_is_preserved() {
    let doc = suite_json(vec![vector_entry(
        "EVT-BAD",
        json!({ "action": "initialize" }),
        json!([{ "action": "process_event", "event": "moon_landing" }]),
        json!([{ "path": "frustration", "expected": 0.0, "type": "equals" }]),
    )]);
    let suite = VectorSuite::load_str(&doc.to_string()).expect("suite");
    let factory = ProcessModelFactory::probe(reference_spec(&[], Duration::from_secs(10)))
        .expect("probe");

    let results = run_suite(&factory, &suite, |_| {});
    assert_eq!(results[0].status, TestStatus::Error);
    let message = results[0].message.as_deref().unwrap_or_default();
    assert!(message.contains("unknown event 'moon_landing'"), "{message}");
}

#[test]
fn hung_implementation_times_out_and_next_vector_runs() {
    let doc = suite_json(vec![
        vector_entry(
            "HANG-001",
            json!({ "action": "initialize" }),
            json!([{ "action": "process_event", "event": "deadline_near" }]),
            json!([{ "path": "urgency", "expected": 0.25, "type": "approximately" }]),
        ),
        vector_entry(
            "AFTER-HANG",
            json!({ "action": "initialize" }),
            json!([{ "action": "process_event", "event": "task_failed" }]),
            json!([{ "path": "frustration", "expected": 0.3, "type": "approximately" }]),
        ),
    ]);
    let suite = VectorSuite::load_str(&doc.to_string()).expect("suite");
    let factory = ProcessModelFactory::probe(reference_spec(
        &["--hang-on", "deadline_near"],
        Duration::from_secs(1),
    ))
    .expect("probe");

    let results = run_suite(&factory, &suite, |_| {});
    assert_eq!(results[0].status, TestStatus::Error);
    let message = results[0].message.as_deref().unwrap_or_default();
    assert!(message.contains("did not respond"), "{message}");
    assert_eq!(
        results[1].status,
        TestStatus::Passed,
        "{:?}",
        results[1].message
    );
}

#[test]
fn crashing_implementation_fails_probe() {
    let err = ProcessModelFactory::probe(reference_spec(&["--crash"], Duration::from_secs(5)))
        .expect_err("crash");
    assert!(
        matches!(err, ModelError::Protocol(_) | ModelError::Io(_)),
        "{err:?}"
    );
}
