//! Dotted path resolution into a state snapshot.

use serde_json::Value;
use thiserror::Error;

/// Why a dotted path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path segment in '{path}'")]
    EmptySegment { path: String },
    #[error("cannot access '{segment}': key missing under '{parent}'")]
    MissingKey { segment: String, parent: String },
    #[error("cannot access '{segment}': '{parent}' is {found}, not an object")]
    NotTraversable {
        segment: String,
        parent: String,
        found: &'static str,
    },
}

/// Walk `root` along the `.`-separated keys of `path`.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let mut current = root;
    let mut walked: Vec<&str> = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment {
                path: path.to_string(),
            });
        }
        let parent = if walked.is_empty() {
            "<root>".to_string()
        } else {
            walked.join(".")
        };
        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| PathError::MissingKey {
                segment: segment.to_string(),
                parent: parent.clone(),
            })?,
            other => {
                return Err(PathError::NotTraversable {
                    segment: segment.to_string(),
                    parent,
                    found: kind_name(other),
                });
            }
        };
        walked.push(segment);
    }
    Ok(current)
}

pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
