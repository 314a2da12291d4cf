//! Replays a vector's steps against a fresh adapter.
//!
//! Per vector: `Setup -> Running -> {Done | Error}`. Any failure in setup or
//! while running aborts the remaining steps of that vector only.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::adapter::Adapter;
use crate::core::model::{ModelError, ModelFactory};
use crate::core::vector::{RawStep, Setup, TestVector};

/// The only executable setup action.
pub const SETUP_INITIALIZE: &str = "initialize";

/// A recognized step, parsed from its raw form at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    ProcessEvent(&'a str),
    AdvanceTime(u64),
    GetRecommendedAction,
}

impl<'a> Step<'a> {
    pub fn parse(index: usize, raw: &'a RawStep) -> Result<Self, ExecutionError> {
        let malformed = |reason: &str| ExecutionError::MalformedStep {
            index,
            action: raw.action.clone(),
            reason: reason.to_string(),
        };
        match raw.action.as_str() {
            "process_event" => raw
                .params
                .get("event")
                .and_then(Value::as_str)
                .map(Step::ProcessEvent)
                .ok_or_else(|| malformed("'event' must be a string")),
            "advance_time" => raw
                .params
                .get("seconds")
                .and_then(Value::as_u64)
                .map(Step::AdvanceTime)
                .ok_or_else(|| malformed("'seconds' must be a non-negative integer")),
            "get_recommended_action" => Ok(Step::GetRecommendedAction),
            other => Err(ExecutionError::UnknownStepAction {
                index,
                action: other.to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Step::ProcessEvent(_) => "process_event",
            Step::AdvanceTime(_) => "advance_time",
            Step::GetRecommendedAction => "get_recommended_action",
        }
    }
}

/// Reasons a vector did not reach `Done`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("unknown setup action '{0}'")]
    UnknownSetupAction(String),
    #[error("setup failed: {0}")]
    Setup(#[source] ModelError),
    #[error("setup failed: initial_state.{field}: {source}")]
    InitialState {
        field: String,
        #[source]
        source: ModelError,
    },
    #[error("steps[{index}]: unknown step action '{action}'")]
    UnknownStepAction { index: usize, action: String },
    #[error("steps[{index}] ({action}): {reason}")]
    MalformedStep {
        index: usize,
        action: String,
        reason: String,
    },
    #[error("steps[{index}] ({action}) failed: {source}")]
    Step {
        index: usize,
        action: &'static str,
        #[source]
        source: ModelError,
    },
    #[error("snapshot failed: {0}")]
    Snapshot(#[source] ModelError),
}

/// Observable result of a vector that reached `Done`.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub snapshot: Value,
    /// Set only by a `get_recommended_action` step; never part of the snapshot.
    pub recommended_action: Option<String>,
    pub steps_run: usize,
}

/// Build a fresh adapter, apply setup, then run every step in order.
#[instrument(skip_all, fields(vector_id = %vector.id))]
pub fn execute(factory: &dyn ModelFactory, vector: &TestVector) -> Result<Execution, ExecutionError> {
    let mut adapter = setup(factory, &vector.setup)?;

    let mut recommended_action = None;
    for (index, raw) in vector.steps.iter().enumerate() {
        let step = Step::parse(index, raw)?;
        let failed = |source| ExecutionError::Step {
            index,
            action: step.name(),
            source,
        };
        match step {
            Step::ProcessEvent(event) => {
                debug!(index, event, "process_event");
                adapter.process_event(event).map_err(failed)?;
            }
            Step::AdvanceTime(seconds) => {
                let intervals = adapter.advance_time(seconds).map_err(failed)?;
                debug!(index, seconds, intervals, "advance_time");
            }
            Step::GetRecommendedAction => {
                let action = adapter.recommended_action().map_err(failed)?;
                debug!(index, action = %action, "get_recommended_action");
                recommended_action = Some(action);
            }
        }
    }

    let snapshot = adapter.snapshot().map_err(ExecutionError::Snapshot)?;
    Ok(Execution {
        snapshot,
        recommended_action,
        steps_run: vector.steps.len(),
    })
}

fn setup(factory: &dyn ModelFactory, setup: &Setup) -> Result<Adapter, ExecutionError> {
    if setup.action != SETUP_INITIALIZE {
        return Err(ExecutionError::UnknownSetupAction(setup.action.clone()));
    }
    let model = factory.create().map_err(ExecutionError::Setup)?;
    let mut adapter = Adapter::new(model);
    adapter.initialize().map_err(ExecutionError::Setup)?;
    if let Some(initial_state) = &setup.initial_state {
        for (field, value) in initial_state {
            adapter
                .set_field(field, value)
                .map_err(|source| ExecutionError::InitialState {
                    field: field.clone(),
                    source,
                })?;
        }
    }
    Ok(adapter)
}
