//! Test-only models and vector builders.
//!
//! [`RecordingModel`] logs every capability call so tests can assert on the
//! exact call sequence. [`ReferenceModel`] is a small but complete state
//! model used to drive whole vectors and the `reference-model` binary.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use crate::core::adapter::DECAY_INTERVAL_SECS;
use crate::core::model::{ImplementationInfo, ModelError, ModelFactory, StateModel};

/// Shared, ordered log of capability calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Count calls named `name`, with or without arguments.
    pub fn count(&self, name: &str) -> usize {
        let with_args = format!("{name}(");
        self.0
            .borrow()
            .iter()
            .filter(|call| call.as_str() == name || call.starts_with(&with_args))
            .count()
    }
}

/// Model that records calls and otherwise does nothing interesting.
pub struct RecordingModel {
    native_advance: bool,
    fail_on: Option<String>,
    fail_call: Option<String>,
    log: CallLog,
    events: u64,
}

impl RecordingModel {
    pub fn new(native_advance: bool) -> Self {
        Self {
            native_advance,
            fail_on: None,
            fail_call: None,
            log: CallLog::default(),
            events: 0,
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn check(&self, call: &str) -> Result<(), ModelError> {
        if self.fail_call.as_deref() == Some(call) {
            return Err(ModelError::Runtime(format!("{call} rejected")));
        }
        Ok(())
    }
}

impl StateModel for RecordingModel {
    fn initialize(&mut self) -> Result<(), ModelError> {
        self.log.push("initialize");
        self.check("initialize")?;
        self.events = 0;
        Ok(())
    }

    fn set_field(&mut self, field: &str, _value: &Value) -> Result<(), ModelError> {
        self.log.push(format!("set_field({field})"));
        self.check("set_field")
    }

    fn process_event(&mut self, event: &str) -> Result<(), ModelError> {
        self.log.push(format!("process_event({event})"));
        if self.fail_on.as_deref() == Some(event) {
            return Err(ModelError::Runtime(format!("event '{event}' rejected")));
        }
        self.events += 1;
        Ok(())
    }

    fn apply_decay(&mut self) -> Result<(), ModelError> {
        self.log.push("apply_decay");
        Ok(())
    }

    fn recommended_action(&mut self) -> Result<String, ModelError> {
        self.log.push("recommended_action");
        Ok("continue".to_string())
    }

    fn supports_advance_time(&self) -> bool {
        self.log.push("supports_advance_time");
        self.native_advance
    }

    fn advance_time(&mut self, seconds: u64) -> Result<(), ModelError> {
        self.log.push(format!("advance_time({seconds})"));
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Value, ModelError> {
        self.log.push("snapshot");
        self.check("snapshot")?;
        Ok(json!({ "events": self.events }))
    }
}

/// Factory whose models all append to one shared [`CallLog`].
pub struct RecordingFactory {
    info: ImplementationInfo,
    native_advance: bool,
    fail_on: Option<String>,
    fail_call: Option<String>,
    log: CallLog,
}

impl RecordingFactory {
    pub fn new(native_advance: bool) -> Self {
        Self {
            info: ImplementationInfo::unknown("recording"),
            native_advance,
            fail_on: None,
            fail_call: None,
            log: CallLog::default(),
        }
    }

    /// Make `process_event(event)` fail with a runtime error.
    pub fn failing_on(mut self, event: &str) -> Self {
        self.fail_on = Some(event.to_string());
        self
    }

    /// Make one capability fail with "`call` rejected". `create` fails
    /// construction itself; `initialize`, `set_field` and `snapshot` fail on
    /// the model.
    pub fn failing_call(mut self, call: &str) -> Self {
        self.fail_call = Some(call.to_string());
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl ModelFactory for RecordingFactory {
    fn info(&self) -> &ImplementationInfo {
        &self.info
    }

    fn create(&self) -> Result<Box<dyn StateModel>, ModelError> {
        if self.fail_call.as_deref() == Some("create") {
            return Err(ModelError::Runtime("create rejected".to_string()));
        }
        Ok(Box::new(RecordingModel {
            native_advance: self.native_advance,
            fail_on: self.fail_on.clone(),
            fail_call: self.fail_call.clone(),
            log: self.log.clone(),
            events: 0,
        }))
    }
}

const PRIMITIVES: [&str; 5] = ["frustration", "trust", "urgency", "stress", "caution"];
const DECAY_RATE: f64 = 0.1;

/// Small emotional-state model with clamped primitives.
///
/// Effects: `task_failed` frustration +0.3 / trust -0.1 / stress +0.1,
/// `task_succeeded` frustration -0.2 / trust +0.1, `deadline_near` urgency
/// +0.25, `error_repeated` caution +0.25 / stress +0.2. Each decay interval
/// moves every primitive 10% of the way back to its baseline.
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    values: [f64; 5],
    trend: &'static str,
    native_advance: bool,
    hang_on: Option<String>,
}

impl ReferenceModel {
    pub fn new(native_advance: bool) -> Self {
        Self {
            values: Self::baseline(),
            trend: "stable",
            native_advance,
            hang_on: None,
        }
    }

    /// Block forever when `event` is processed.
    pub fn hanging_on(mut self, event: &str) -> Self {
        self.hang_on = Some(event.to_string());
        self
    }

    fn baseline() -> [f64; 5] {
        [0.0, 0.5, 0.0, 0.0, 0.0]
    }

    fn index(field: &str) -> Option<usize> {
        PRIMITIVES.iter().position(|name| *name == field)
    }

    fn adjust(&mut self, field: &str, delta: f64) {
        if let Some(index) = Self::index(field) {
            self.values[index] = (self.values[index] + delta).clamp(0.0, 1.0);
        }
    }

    fn get(&self, field: &str) -> f64 {
        Self::index(field).map_or(0.0, |index| self.values[index])
    }
}

impl StateModel for ReferenceModel {
    fn initialize(&mut self) -> Result<(), ModelError> {
        self.values = Self::baseline();
        self.trend = "stable";
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), ModelError> {
        let index = Self::index(field)
            .ok_or_else(|| ModelError::Runtime(format!("unknown field '{field}'")))?;
        let number = value
            .as_f64()
            .ok_or_else(|| ModelError::Runtime(format!("field '{field}' must be numeric")))?;
        self.values[index] = number.clamp(0.0, 1.0);
        Ok(())
    }

    fn process_event(&mut self, event: &str) -> Result<(), ModelError> {
        if self.hang_on.as_deref() == Some(event) {
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
        let before = self.get("frustration");
        match event {
            "task_failed" => {
                self.adjust("frustration", 0.3);
                self.adjust("trust", -0.1);
                self.adjust("stress", 0.1);
            }
            "task_succeeded" => {
                self.adjust("frustration", -0.2);
                self.adjust("trust", 0.1);
            }
            "deadline_near" => self.adjust("urgency", 0.25),
            "error_repeated" => {
                self.adjust("caution", 0.25);
                self.adjust("stress", 0.2);
            }
            other => return Err(ModelError::Runtime(format!("unknown event '{other}'"))),
        }
        let after = self.get("frustration");
        self.trend = if after > before {
            "rising"
        } else if after < before {
            "falling"
        } else {
            "stable"
        };
        Ok(())
    }

    fn apply_decay(&mut self) -> Result<(), ModelError> {
        let baseline = Self::baseline();
        for (value, base) in self.values.iter_mut().zip(baseline) {
            *value = base + (*value - base) * (1.0 - DECAY_RATE);
        }
        Ok(())
    }

    fn recommended_action(&mut self) -> Result<String, ModelError> {
        let action = if self.get("frustration") >= 0.8 {
            "handoff"
        } else if self.get("stress") >= 0.7 {
            "cooldown"
        } else if self.get("caution") >= 0.5 {
            "verify"
        } else {
            "continue"
        };
        Ok(action.to_string())
    }

    fn supports_advance_time(&self) -> bool {
        self.native_advance
    }

    fn advance_time(&mut self, seconds: u64) -> Result<(), ModelError> {
        if !self.native_advance {
            return Err(ModelError::Unsupported("advance_time"));
        }
        for _ in 0..seconds / DECAY_INTERVAL_SECS {
            self.apply_decay()?;
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Value, ModelError> {
        let mut state = serde_json::Map::new();
        for (name, value) in PRIMITIVES.iter().zip(self.values) {
            state.insert((*name).to_string(), json!(value));
        }
        state.insert("metadata".to_string(), json!({ "trend": self.trend }));
        Ok(Value::Object(state))
    }
}

/// Factory for [`ReferenceModel`] instances.
pub struct ReferenceFactory {
    info: ImplementationInfo,
    native_advance: bool,
}

impl ReferenceFactory {
    pub fn new(native_advance: bool) -> Self {
        Self {
            info: reference_info(),
            native_advance,
        }
    }
}

impl Default for ReferenceFactory {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ModelFactory for ReferenceFactory {
    fn info(&self) -> &ImplementationInfo {
        &self.info
    }

    fn create(&self) -> Result<Box<dyn StateModel>, ModelError> {
        Ok(Box::new(ReferenceModel::new(self.native_advance)))
    }
}

pub fn reference_info() -> ImplementationInfo {
    ImplementationInfo {
        name: "reference-model".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        language: "Rust".to_string(),
        license: Some("MIT".to_string()),
    }
}

/// Build a one-vector document with the given setup, steps and assertions.
pub fn vector_json(id: &str, setup: Value, steps: Value, assertions: Value) -> Value {
    suite_json(vec![vector_entry(id, setup, steps, assertions)])
}

pub fn vector_entry(id: &str, setup: Value, steps: Value, assertions: Value) -> Value {
    json!({
        "id": id,
        "name": format!("{id} name"),
        "spec_section": "0",
        "description": format!("{id} description"),
        "setup": setup,
        "steps": steps,
        "assertions": assertions,
    })
}

pub fn suite_json(tests: Vec<Value>) -> Value {
    json!({
        "version": "1.0.0",
        "spec_version": "0.1.0",
        "tests": tests,
    })
}
