//! CLI tests for `conformance validate` and `conformance list`.
//!
//! Spawns the conformance binary against the reference model and checks the
//! console output, exit codes, and the written report.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

use conformance::exit_codes;
use conformance::io::report_store::validate_report;
use conformance::test_support::{suite_json, vector_entry};

fn fixture_vectors() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vectors.json")
}

fn reference_model() -> &'static str {
    env!("CARGO_BIN_EXE_reference-model")
}

fn conformance(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_conformance"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run conformance")
}

fn read_report(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read report");
    let report: Value = serde_json::from_str(&text).expect("parse report");
    validate_report(&report).expect("report matches schema");
    report
}

#[test]
fn validate_conformant_implementation_exits_ok() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report_path = temp.path().join("conformance-report.json");
    let vectors = fixture_vectors();

    let output = conformance(
        temp.path(),
        &[
            "validate",
            reference_model(),
            "--vectors",
            vectors.to_str().expect("utf8 path"),
        ],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{stdout}");
    assert!(stdout.contains("Testing implementation: reference-model"));
    assert!(stdout.contains("✓ INIT-001: Initialization - PASSED"));
    assert!(stdout.contains("Results: 5 passed, 0 failed out of 5 total"));
    assert!(stdout.contains("✓ CONFORMANT"));

    let report = read_report(&report_path);
    assert_eq!(report["test_results"]["total"], 5);
    assert_eq!(report["test_results"]["pass_rate"], 100.0);
    assert_eq!(report["implementation"]["name"], "reference-model");
    assert!(
        report["conformance_statement"]
            .as_str()
            .expect("statement")
            .contains("fully conformant")
    );
    assert!(report.get("certification_date").is_none());
}

#[test]
fn validate_with_failures_and_errors_exits_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let doc = suite_json(vec![
        vector_entry(
            "PASS-001",
            json!({ "action": "initialize" }),
            json!([]),
            json!([{ "path": "trust", "expected": 0.5, "type": "equals" }]),
        ),
        vector_entry(
            "FAIL-001",
            json!({ "action": "initialize" }),
            json!([{ "action": "process_event", "event": "task_failed" }]),
            json!([{ "path": "frustration", "expected": 0.9, "type": "approximately" }]),
        ),
        vector_entry(
            "STEP-404",
            json!({ "action": "initialize" }),
            json!([{ "action": "teleport" }]),
            json!([{ "path": "trust", "expected": 0.5, "type": "equals" }]),
        ),
    ]);
    let vectors = temp.path().join("vectors.json");
    fs::write(&vectors, doc.to_string()).expect("write vectors");

    let output = conformance(
        temp.path(),
        &[
            "validate",
            reference_model(),
            "--vectors",
            "vectors.json",
            "--report",
            "out/report.json",
        ],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED), "{stdout}");
    assert!(stdout.contains("✗ FAIL-001: FAIL-001 name - FAILED: frustration: expected ~0.9"));
    assert!(stdout.contains("✗ STEP-404: STEP-404 name - ERROR: steps[0]: unknown step action 'teleport'"));
    assert!(stdout.contains("Results: 1 passed, 2 failed out of 3 total"));
    assert!(stdout.contains("✗ NON-CONFORMANT"));

    let report = read_report(&temp.path().join("out/report.json"));
    assert_eq!(report["test_results"]["passed"], 1);
    assert_eq!(report["test_results"]["failed"], 1);
    assert_eq!(report["test_results"]["errors"], 1);
    let ids: Vec<&str> = report["test_details"]
        .as_array()
        .expect("details")
        .iter()
        .map(|detail| detail["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["PASS-001", "FAIL-001", "STEP-404"]);
    assert_eq!(report["test_details"][2]["status"], "ERROR");
}

#[test]
fn validate_with_maintainer_config_certifies_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("conformance.toml"),
        format!(
            r#"
vectors = "{}"
report = "certified.json"
certification_date = "2026-03-01"

[implementation]
name = "aifeels-rs"
version = "2.0.0"

[maintainer]
name = "Jordan"
email = "jordan@example.com"
"#,
            fixture_vectors().display()
        ),
    )
    .expect("write config");

    let output = conformance(temp.path(), &["validate", reference_model()]);
    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&temp.path().join("certified.json"));
    assert_eq!(report["implementation"]["name"], "aifeels-rs");
    assert_eq!(report["implementation"]["version"], "2.0.0");
    assert_eq!(report["implementation"]["language"], "Rust");
    assert_eq!(report["certification_date"], "2026-03-01");
    assert_eq!(report["maintainer"]["email"], "jordan@example.com");
}

#[test]
fn validate_with_missing_vectors_fails_before_running() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = conformance(
        temp.path(),
        &["validate", reference_model(), "--vectors", "absent.json"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stderr.contains("absent.json"), "{stderr}");
    assert!(!temp.path().join("conformance-report.json").exists());
}

#[test]
fn validate_with_unstartable_implementation_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let vectors = fixture_vectors();
    let output = conformance(
        temp.path(),
        &[
            "validate",
            "/nonexistent/model",
            "--vectors",
            vectors.to_str().expect("utf8 path"),
        ],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stderr.contains("start implementation"), "{stderr}");
}

#[test]
fn list_prints_every_vector() {
    let temp = tempfile::tempdir().expect("tempdir");
    let vectors = fixture_vectors();
    let output = conformance(
        temp.path(),
        &["list", "--vectors", vectors.to_str().expect("utf8 path")],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let ids: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(
        ids,
        vec!["INIT-001", "CLAMP-001", "DECAY-001", "ACTION-001", "TREND-001"]
    );
}
