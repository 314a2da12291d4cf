//! Line protocol between the harness and an out-of-process model.
//!
//! Each request is one JSON object on its own line, tagged by `op`. Each
//! response is one JSON object: `{"ok":true,"result":...}` or
//! `{"ok":false,"error":"..."}`. [`serve`] implements the model side for any
//! [`StateModel`], so Rust implementations can be wrapped directly.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::model::{ImplementationInfo, ModelError, StateModel};

/// Capability flag advertised by models with native time advance.
pub const CAPABILITY_ADVANCE_TIME: &str = "advance_time";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Describe,
    Initialize,
    SetField { field: String, value: Value },
    ProcessEvent { event: String },
    ApplyDecay,
    AdvanceTime { seconds: u64 },
    RecommendedAction,
    Snapshot,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: Value::Null,
            error: Some(message.into()),
        }
    }

    /// `ok:false` becomes a runtime error carrying the model's message as-is.
    pub fn into_result(self) -> Result<Value, ModelError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(ModelError::Runtime(
                self.error
                    .unwrap_or_else(|| "implementation reported an error".to_string()),
            ))
        }
    }
}

/// Result payload of `describe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Description {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|cap| cap == capability)
    }

    /// Fill gaps with `unknown`, naming the model `fallback_name` if unnamed.
    pub fn implementation_info(&self, fallback_name: &str) -> ImplementationInfo {
        let unknown = || "unknown".to_string();
        ImplementationInfo {
            name: self.name.clone().unwrap_or_else(|| fallback_name.to_string()),
            version: self.version.clone().unwrap_or_else(unknown),
            language: self.language.clone().unwrap_or_else(unknown),
            license: self.license.clone(),
        }
    }
}

/// Serve one model over the line protocol until `shutdown` or end of input.
pub fn serve<R: BufRead, W: Write>(
    info: &ImplementationInfo,
    model: &mut dyn StateModel,
    reader: R,
    mut writer: W,
) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(&mut writer, &Response::failure(format!("invalid request: {err}")))?;
                continue;
            }
        };
        debug!(request = ?request, "serving request");
        if request == Request::Shutdown {
            write_response(&mut writer, &Response::success(Value::Null))?;
            return Ok(());
        }
        let response = match dispatch(info, model, request) {
            Ok(result) => Response::success(result),
            Err(err) => Response::failure(err.to_string()),
        };
        write_response(&mut writer, &response)?;
    }
    Ok(())
}

fn dispatch(
    info: &ImplementationInfo,
    model: &mut dyn StateModel,
    request: Request,
) -> Result<Value, ModelError> {
    match request {
        Request::Describe => {
            let mut capabilities = Vec::new();
            if model.supports_advance_time() {
                capabilities.push(CAPABILITY_ADVANCE_TIME.to_string());
            }
            let description = Description {
                name: Some(info.name.clone()),
                version: Some(info.version.clone()),
                language: Some(info.language.clone()),
                license: info.license.clone(),
                capabilities,
            };
            serde_json::to_value(description).map_err(|err| ModelError::Protocol(err.to_string()))
        }
        Request::Initialize => model.initialize().map(|()| Value::Null),
        Request::SetField { field, value } => model.set_field(&field, &value).map(|()| Value::Null),
        Request::ProcessEvent { event } => model.process_event(&event).map(|()| Value::Null),
        Request::ApplyDecay => model.apply_decay().map(|()| Value::Null),
        Request::AdvanceTime { seconds } => model.advance_time(seconds).map(|()| Value::Null),
        Request::RecommendedAction => model.recommended_action().map(Value::String),
        Request::Snapshot => model.snapshot(),
        Request::Shutdown => Ok(Value::Null),
    }
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    let mut line = serde_json::to_string(response).map_err(io::Error::other)?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ReferenceModel, reference_info};
    use serde_json::json;

    fn serve_lines(model: &mut ReferenceModel, input: &str) -> Vec<Response> {
        let mut output = Vec::new();
        serve(&reference_info(), model, input.as_bytes(), &mut output).expect("serve");
        String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("response json"))
            .collect()
    }

    #[test]
    fn requests_use_op_tag() {
        let encoded = serde_json::to_value(Request::ProcessEvent {
            event: "task_failed".to_string(),
        })
        .expect("json");
        assert_eq!(encoded, json!({ "op": "process_event", "event": "task_failed" }));
        let decoded: Request = serde_json::from_str(r#"{"op":"advance_time","seconds":600}"#)
            .expect("decode");
        assert_eq!(decoded, Request::AdvanceTime { seconds: 600 });
    }

    #[test]
    fn failure_response_keeps_message() {
        let err = Response::failure("unknown event 'x'")
            .into_result()
            .expect_err("failure");
        assert_eq!(err.to_string(), "unknown event 'x'");
    }

    #[test]
    fn serve_answers_each_request_in_order() {
        let mut model = ReferenceModel::new(true);
        let input = [
            r#"{"op":"describe"}"#,
            r#"{"op":"initialize"}"#,
            r#"{"op":"process_event","event":"task_failed"}"#,
            r#"{"op":"recommended_action"}"#,
            r#"{"op":"process_event","event":"nope"}"#,
            r#"{"op":"bogus"}"#,
            r#"{"op":"shutdown"}"#,
            r#"{"op":"snapshot"}"#,
        ]
        .join("\n");
        let responses = serve_lines(&mut model, &input);
        assert_eq!(responses.len(), 7, "nothing is served after shutdown");

        let description: Description =
            serde_json::from_value(responses[0].result.clone()).expect("description");
        assert!(description.supports(CAPABILITY_ADVANCE_TIME));
        assert_eq!(description.name.as_deref(), Some("reference-model"));

        assert!(responses[1].ok && responses[2].ok);
        assert_eq!(responses[3].result, json!("continue"));
        assert_eq!(responses[4].error.as_deref(), Some("unknown event 'nope'"));
        assert!(!responses[5].ok);
        assert!(responses[6].ok);
    }

    #[test]
    fn description_fills_unknowns() {
        let info = Description::default().implementation_info("my-model");
        assert_eq!(info.name, "my-model");
        assert_eq!(info.version, "unknown");
        assert_eq!(info.license, None);
    }
}
