use serde::{Deserialize, Serialize};

use crate::core::assertion::evaluate;
use crate::core::interpreter::{Execution, ExecutionError};
use crate::core::vector::TestVector;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
}

/// Outcome of one vector. Exactly one is produced per loaded vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
    pub id: String,
    pub name: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Classify a vector: `Error` if the interpreter did not reach `Done`,
/// otherwise `Passed` iff every assertion holds.
///
/// All assertions are evaluated so the message lists every broken one.
pub fn classify_outcome(
    vector: &TestVector,
    execution: Result<Execution, ExecutionError>,
) -> TestResult {
    let (status, message) = match execution {
        Err(err) => (TestStatus::Error, Some(err.to_string())),
        Ok(_) if vector.assertions.is_empty() => (
            TestStatus::Failed,
            Some("no assertions declared".to_string()),
        ),
        Ok(execution) => {
            let failures: Vec<String> = vector
                .assertions
                .iter()
                .filter_map(|assertion| {
                    evaluate(
                        &execution.snapshot,
                        execution.recommended_action.as_deref(),
                        assertion,
                    )
                    .err()
                    .map(|failure| match &assertion.note {
                        Some(note) => format!("{failure} (note: {note})"),
                        None => failure.to_string(),
                    })
                })
                .collect();
            if failures.is_empty() {
                (TestStatus::Passed, None)
            } else {
                (TestStatus::Failed, Some(failures.join("; ")))
            }
        }
    };
    TestResult {
        id: vector.id.clone(),
        name: vector.name.clone(),
        status,
        message,
    }
}
