//! Conformance report emission.
//!
//! This is the only place the harness writes to disk. Reports are checked
//! against the bundled v1 schema before being written.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use serde_json::Value;

use crate::core::report::ConformanceReport;

pub const REPORT_SCHEMA_V1: &str =
    include_str!("../../../schemas/conformance_report/v1.schema.json");

/// Validate `report` against the v1 schema and write it atomically
/// (temp file + rename) as pretty JSON with a trailing newline.
pub fn write_report(path: &Path, report: &ConformanceReport) -> Result<()> {
    let value = serde_json::to_value(report).context("serialize report")?;
    validate_report(&value)?;
    let mut payload = serde_json::to_string_pretty(&value).context("serialize report")?;
    payload.push('\n');
    write_atomic(path, &payload)
}

/// Check a report document against the bundled JSON Schema (Draft 2020-12).
pub fn validate_report(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(REPORT_SCHEMA_V1).context("parse report schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| anyhow!("compile report schema: {err}"))?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("report schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp report {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ImplementationInfo;
    use crate::core::outcome::{TestResult, TestStatus};
    use serde_json::json;

    fn report() -> ConformanceReport {
        ConformanceReport::build(
            ImplementationInfo::unknown("impl"),
            "0.1.0",
            "1.0.0",
            vec![
                TestResult {
                    id: "A".to_string(),
                    name: "a".to_string(),
                    status: TestStatus::Passed,
                    message: None,
                },
                TestResult {
                    id: "B".to_string(),
                    name: "b".to_string(),
                    status: TestStatus::Error,
                    message: Some("steps[0]: unknown step action 'teleport'".to_string()),
                },
            ],
            None,
        )
    }

    #[test]
    fn writes_schema_valid_report() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out").join("conformance-report.json");
        write_report(&path, &report()).expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with('\n'));
        let parsed: ConformanceReport = serde_json::from_str(&contents).expect("parse");
        assert_eq!(parsed, report());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn schema_rejects_unknown_status() {
        let mut value = serde_json::to_value(report()).expect("json");
        value["test_details"][0]["status"] = json!("SKIPPED");
        let err = validate_report(&value).expect_err("invalid status");
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn schema_requires_summary_fields() {
        let mut value = serde_json::to_value(report()).expect("json");
        value["test_results"]
            .as_object_mut()
            .expect("object")
            .remove("errors");
        assert!(validate_report(&value).is_err());
    }
}
