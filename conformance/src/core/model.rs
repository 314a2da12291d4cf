//! Capability contract for an implementation under test.
//!
//! The harness only ever talks to a [`StateModel`]. Concrete implementations
//! are produced by a [`ModelFactory`] resolved once at startup (see
//! [`crate::io::process::ProcessModelFactory`]); tests use in-memory models
//! from `test_support`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identity of the implementation under test, copied into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationInfo {
    pub name: String,
    pub version: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl ImplementationInfo {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "unknown".to_string(),
            language: "unknown".to_string(),
            license: None,
        }
    }
}

/// Failure surfaced by the implementation under test.
///
/// The adapter never rewrites these; the interpreter turns them into an
/// `ERROR` outcome with the message preserved.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The implementation reported a failure while handling a call.
    #[error("{0}")]
    Runtime(String),
    #[error("capability '{0}' is not supported")]
    Unsupported(&'static str),
    #[error("implementation did not respond within {0:?}")]
    Timeout(Duration),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fixed operation set every implementation under test must expose.
///
/// Numeric primitives in the snapshot are expected to be clamped to
/// `[0.0, 1.0]` by the implementation; the harness never clamps.
pub trait StateModel {
    /// Reset to default-initialized state.
    fn initialize(&mut self) -> Result<(), ModelError>;

    /// Override one field after initialization (`setup.initial_state`).
    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), ModelError>;

    fn process_event(&mut self, event: &str) -> Result<(), ModelError>;

    /// Apply exactly one fixed-size decay interval.
    fn apply_decay(&mut self) -> Result<(), ModelError>;

    fn recommended_action(&mut self) -> Result<String, ModelError>;

    /// Whether [`StateModel::advance_time`] is implemented natively.
    fn supports_advance_time(&self) -> bool {
        false
    }

    fn advance_time(&mut self, _seconds: u64) -> Result<(), ModelError> {
        Err(ModelError::Unsupported("advance_time"))
    }

    /// Observable state as a tree of mappings and scalars.
    fn snapshot(&mut self) -> Result<Value, ModelError>;
}

/// Produces one fresh [`StateModel`] per vector.
pub trait ModelFactory {
    fn info(&self) -> &ImplementationInfo;

    fn create(&self) -> Result<Box<dyn StateModel>, ModelError>;
}
