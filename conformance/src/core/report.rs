//! Result aggregation and the conformance report schema.

use serde::{Deserialize, Serialize};

use crate::core::model::ImplementationInfo;
use crate::core::outcome::{TestResult, TestStatus};
use crate::exit_codes;

/// Name used in the conformance statement.
pub const SPEC_TITLE: &str = "Aifeels Specification";

/// Aggregate counts over all vector results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    /// `passed / total * 100`, or 0 when there are no results.
    pub pass_rate: f64,
}

impl ReportSummary {
    pub fn aggregate(results: &[TestResult]) -> Self {
        let total = results.len();
        let passed = count(results, TestStatus::Passed);
        let errors = count(results, TestStatus::Error);
        let failed = total - passed - errors;
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };
        Self {
            total,
            passed,
            failed,
            errors,
            pass_rate,
        }
    }

    pub fn is_conformant(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_conformant() {
            exit_codes::OK
        } else {
            exit_codes::FAILED
        }
    }
}

fn count(results: &[TestResult], status: TestStatus) -> usize {
    results
        .iter()
        .filter(|result| result.status == status)
        .count()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Metadata attached when a report is produced for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certification {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub maintainer: Maintainer,
}

/// The fixed, machine-readable conformance report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceReport {
    pub implementation: ImplementationInfo,
    pub spec_version: String,
    pub test_suite_version: String,
    pub test_results: ReportSummary,
    pub test_details: Vec<TestResult>,
    pub conformance_statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<Maintainer>,
}

impl ConformanceReport {
    /// Build the report once every vector has run. `results` must already be
    /// in vector-file order.
    pub fn build(
        implementation: ImplementationInfo,
        spec_version: &str,
        test_suite_version: &str,
        results: Vec<TestResult>,
        certification: Option<Certification>,
    ) -> Self {
        let summary = ReportSummary::aggregate(&results);
        let conformance_statement = conformance_statement(&summary, spec_version);
        let (certification_date, maintainer) = match certification {
            Some(cert) => (Some(cert.date), Some(cert.maintainer)),
            None => (None, None),
        };
        Self {
            implementation,
            spec_version: spec_version.to_string(),
            test_suite_version: test_suite_version.to_string(),
            test_results: summary,
            test_details: results,
            conformance_statement,
            certification_date,
            maintainer,
        }
    }
}

/// Either full conformance or none; there is no partial wording.
pub fn conformance_statement(summary: &ReportSummary, spec_version: &str) -> String {
    let verdict = if summary.is_conformant() {
        "fully conformant"
    } else {
        "NOT conformant"
    };
    format!("This implementation is {verdict} with the {SPEC_TITLE} v{spec_version}.")
}
