//! Test vector document parsing.
//!
//! Only the envelope is checked at load time: the top-level fields and the
//! required per-vector fields (`id`, `name`, `setup`, `steps`, `assertions`).
//! Step and assertion contents stay raw until execution so that one bad
//! vector yields an `ERROR`/`FAILED` outcome instead of blocking the suite.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default tolerance for `approximately` assertions.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// A loaded vector file.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSuite {
    pub version: String,
    pub spec_version: String,
    pub tests: Vec<TestVector>,
}

/// One declarative conformance test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub spec_section: String,
    #[serde(default)]
    pub description: String,
    pub setup: Setup,
    pub steps: Vec<RawStep>,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    /// Only `initialize` is executable; anything else errors at run time.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Map<String, Value>>,
}

/// A step as written in the vector file: an action tag plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    pub action: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub path: String,
    pub expected: Value,
    /// `equals` or `approximately`; interpreted by the evaluator.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Assertion {
    pub fn tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }
}

/// The vector document could not be loaded.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("parse vector document: {0}")]
    Document(#[source] serde_json::Error),
    #[error("vector document missing '{0}'")]
    MissingTopLevel(&'static str),
    #[error("tests[{index}] is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate vector id '{0}'")]
    DuplicateId(String),
}

#[derive(Deserialize)]
struct Envelope {
    version: Option<Value>,
    spec_version: Option<Value>,
    tests: Option<Vec<Value>>,
}

impl VectorSuite {
    /// Parse a vector document. Any malformed entry aborts the whole load.
    pub fn load_str(contents: &str) -> Result<Self, VectorError> {
        let envelope: Envelope = serde_json::from_str(contents).map_err(VectorError::Document)?;
        let version = envelope
            .version
            .map(version_string)
            .ok_or(VectorError::MissingTopLevel("version"))?;
        let spec_version = envelope
            .spec_version
            .map(version_string)
            .ok_or(VectorError::MissingTopLevel("spec_version"))?;
        let raw_tests = envelope
            .tests
            .ok_or(VectorError::MissingTopLevel("tests"))?;

        let mut tests = Vec::with_capacity(raw_tests.len());
        let mut seen = BTreeSet::new();
        for (index, raw) in raw_tests.into_iter().enumerate() {
            let vector: TestVector = serde_json::from_value(raw)
                .map_err(|source| VectorError::Malformed { index, source })?;
            if !seen.insert(vector.id.clone()) {
                return Err(VectorError::DuplicateId(vector.id));
            }
            tests.push(vector);
        }

        Ok(Self {
            version,
            spec_version,
            tests,
        })
    }
}

// Versions are usually strings but a bare number like `1.0` is accepted.
fn version_string(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
