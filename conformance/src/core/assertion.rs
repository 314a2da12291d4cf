//! Assertion evaluation against a state snapshot.

use serde_json::{Number, Value};
use thiserror::Error;

use crate::core::path::{PathError, kind_name, resolve};
use crate::core::vector::Assertion;

/// Reserved path that reads the stored recommended action instead of the
/// snapshot.
pub const RECOMMENDED_ACTION_PATH: &str = "recommended_action";

/// Comparison mode of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    /// Strict equality, no rounding slack.
    Equals,
    /// Numeric only: `|actual - expected| <= tolerance`.
    Approximately,
}

impl AssertionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "equals" => Some(Self::Equals),
            "approximately" => Some(Self::Approximately),
            _ => None,
        }
    }
}

/// A failed assertion. Never escapes as a fault; always reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssertionFailure {
    #[error("unknown assertion type '{kind}' for {path}")]
    UnknownType { path: String, kind: String },
    #[error("recommended_action not set: no get_recommended_action step ran")]
    RecommendedActionUnset,
    #[error("cannot access {path}: {source}")]
    Access {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("{path}: expected {expected}, got {actual}")]
    NotEqual {
        path: String,
        expected: Value,
        actual: Value,
    },
    #[error("{path}: expected ~{expected}, got {actual} (tolerance: {tolerance})")]
    OutsideTolerance {
        path: String,
        expected: f64,
        actual: f64,
        tolerance: f64,
    },
    #[error("{path}: approximately needs numbers, {side} value {value} is {found}")]
    NotNumeric {
        path: String,
        side: &'static str,
        value: Value,
        found: &'static str,
    },
    #[error("{path}: tolerance {tolerance} must be finite and >= 0")]
    InvalidTolerance { path: String, tolerance: f64 },
}

/// Evaluate one assertion against the snapshot and the stored recommended
/// action (if a `get_recommended_action` step ran).
pub fn evaluate(
    snapshot: &Value,
    recommended_action: Option<&str>,
    assertion: &Assertion,
) -> Result<(), AssertionFailure> {
    let path = assertion.path.as_str();
    let Some(kind) = AssertionKind::parse(&assertion.kind) else {
        return Err(AssertionFailure::UnknownType {
            path: path.to_string(),
            kind: assertion.kind.clone(),
        });
    };

    let stored;
    let actual = if path == RECOMMENDED_ACTION_PATH {
        let action = recommended_action.ok_or(AssertionFailure::RecommendedActionUnset)?;
        stored = Value::String(action.to_string());
        &stored
    } else {
        resolve(snapshot, path).map_err(|source| AssertionFailure::Access {
            path: path.to_string(),
            source,
        })?
    };

    match kind {
        AssertionKind::Equals => {
            if strictly_equal(actual, &assertion.expected) {
                Ok(())
            } else {
                Err(AssertionFailure::NotEqual {
                    path: path.to_string(),
                    expected: assertion.expected.clone(),
                    actual: actual.clone(),
                })
            }
        }
        AssertionKind::Approximately => approximately(path, actual, assertion),
    }
}

fn approximately(path: &str, actual: &Value, assertion: &Assertion) -> Result<(), AssertionFailure> {
    let tolerance = assertion.tolerance();
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(AssertionFailure::InvalidTolerance {
            path: path.to_string(),
            tolerance,
        });
    }
    let actual_num = as_number(path, "actual", actual)?;
    let expected_num = as_number(path, "expected", &assertion.expected)?;
    if (actual_num - expected_num).abs() <= tolerance {
        Ok(())
    } else {
        Err(AssertionFailure::OutsideTolerance {
            path: path.to_string(),
            expected: expected_num,
            actual: actual_num,
            tolerance,
        })
    }
}

fn as_number(path: &str, side: &'static str, value: &Value) -> Result<f64, AssertionFailure> {
    value.as_f64().ok_or_else(|| AssertionFailure::NotNumeric {
        path: path.to_string(),
        side,
        value: value.clone(),
        found: kind_name(value),
    })
}

/// Structural equality where numbers compare by value, so `0` equals `0.0`
/// but `0.30000000000000004` does not equal `0.3`.
fn strictly_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| strictly_equal(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    right
                        .get(key)
                        .is_some_and(|other| strictly_equal(value, other))
                })
        }
        _ => actual == expected,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (integer(left), integer(right)) {
        (Some(left), Some(right)) => left == right,
        (Some(int), None) => right.as_f64().is_some_and(|float| integral_equals(float, int)),
        (None, Some(int)) => left.as_f64().is_some_and(|float| integral_equals(float, int)),
        (None, None) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        },
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

// Mixed int/float pairs compare as integers so large values keep full precision.
fn integral_equals(float: f64, int: i128) -> bool {
    float.is_finite() && float.fract() == 0.0 && float as i128 == int
}
