//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info};

use conformance::core::model::ModelFactory;
use conformance::core::outcome::{TestResult, TestStatus};
use conformance::core::report::{Certification, ConformanceReport, ReportSummary};
use conformance::io::config::{DEFAULT_CONFIG_PATH, HarnessConfig, load_config};
use conformance::io::process::{ProcessModelFactory, ProcessSpec};
use conformance::io::report_store::write_report;
use conformance::io::vector_store::load_vectors;
use conformance::suite::run_suite;

const RULE: &str = "============================================================";

/// Inputs for `conformance validate`.
#[derive(Debug, Clone)]
pub struct ValidateArgs {
    pub implementation: PathBuf,
    pub implementation_args: Vec<String>,
    pub vectors: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Run every vector against the implementation, write the report, and
/// return the process exit code.
pub fn validate(args: &ValidateArgs) -> Result<i32> {
    let mut cfg = resolve_config(args.config.as_deref())?;
    if let Some(vectors) = &args.vectors {
        cfg.vectors = vectors.clone();
    }
    if let Some(report) = &args.report {
        cfg.report = report.clone();
    }
    cfg.validate()?;

    let loaded = load_vectors(&cfg.vectors)?;
    let suite = &loaded.suite;
    debug!(vectors = suite.tests.len(), digest = %loaded.digest, "vectors loaded");

    let factory = ProcessModelFactory::probe(ProcessSpec {
        program: args.implementation.clone(),
        args: args.implementation_args.clone(),
        vector_timeout: Duration::from_secs(cfg.vector_timeout_secs),
    })
    .with_context(|| format!("start implementation {}", args.implementation.display()))?;
    let info = cfg.implementation.apply(factory.info().clone());

    println!("Aifeels Conformance Test Suite v{}", suite.version);
    println!("Spec version: {}", suite.spec_version);
    println!(
        "Testing implementation: {} {} ({})",
        info.name, info.version, info.language
    );
    println!(
        "Vectors: {} (sha256 {})",
        cfg.vectors.display(),
        loaded.digest
    );
    println!("{RULE}");

    let results = run_suite(&factory, suite, print_result);
    let summary = ReportSummary::aggregate(&results);
    print_summary(&summary);

    let report = ConformanceReport::build(
        info,
        &suite.spec_version,
        &suite.version,
        results,
        certification(&cfg),
    );
    write_report(&cfg.report, &report)?;
    println!("\nReport written to: {}", cfg.report.display());
    info!(report = %cfg.report.display(), conformant = summary.is_conformant(), "report written");

    Ok(summary.exit_code())
}

/// Print `id  name` for every vector in the file.
pub fn list_vectors(config: Option<&Path>, vectors: Option<&Path>) -> Result<()> {
    let mut cfg = resolve_config(config)?;
    if let Some(vectors) = vectors {
        cfg.vectors = vectors.to_path_buf();
    }
    let loaded = load_vectors(&cfg.vectors)?;
    for vector in &loaded.suite.tests {
        println!("{}  {}", vector.id, vector.name);
    }
    Ok(())
}

fn resolve_config(explicit: Option<&Path>) -> Result<HarnessConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config {} not found", path.display());
            }
            load_config(path)
        }
        None => load_config(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

fn certification(cfg: &HarnessConfig) -> Option<Certification> {
    let maintainer = cfg.maintainer.clone()?;
    let date = cfg
        .certification_date
        .clone()
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
    Some(Certification { date, maintainer })
}

fn print_result(result: &TestResult) {
    match (result.status, &result.message) {
        (TestStatus::Passed, _) => println!("✓ {}: {} - PASSED", result.id, result.name),
        (status, Some(message)) => println!(
            "✗ {}: {} - {}: {}",
            result.id,
            result.name,
            status_label(status),
            message
        ),
        (status, None) => println!("✗ {}: {} - {}", result.id, result.name, status_label(status)),
    }
}

fn status_label(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "PASSED",
        TestStatus::Failed => "FAILED",
        TestStatus::Error => "ERROR",
    }
}

fn print_summary(summary: &ReportSummary) {
    println!("{RULE}");
    // Errored vectors count as failures on the console line.
    println!(
        "Results: {} passed, {} failed out of {} total",
        summary.passed,
        summary.failed + summary.errors,
        summary.total
    );
    if summary.errors > 0 {
        println!("  ({} of the failures were errors)", summary.errors);
    }
    if summary.is_conformant() {
        println!("✓ CONFORMANT: Implementation passes all tests!");
    } else {
        println!("✗ NON-CONFORMANT: Implementation failed one or more tests.");
    }
}
