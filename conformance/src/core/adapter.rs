//! Capability-normalizing wrapper around one implementation instance.

use serde_json::Value;
use tracing::debug;

use crate::core::model::{ModelError, StateModel};

/// Length of one decay interval in seconds.
pub const DECAY_INTERVAL_SECS: u64 = 300;

/// Owns exactly one model instance for the lifetime of a vector.
///
/// Native `advance_time` support is probed once at construction. Without it,
/// elapsed time is emulated as `seconds / 300` calls to `apply_decay`, which
/// is only equivalent for models whose decay is stateless per interval.
pub struct Adapter {
    model: Box<dyn StateModel>,
    native_advance: bool,
}

impl Adapter {
    pub fn new(model: Box<dyn StateModel>) -> Self {
        let native_advance = model.supports_advance_time();
        debug!(native_advance, "adapter constructed");
        Self {
            model,
            native_advance,
        }
    }

    pub fn native_advance(&self) -> bool {
        self.native_advance
    }

    pub fn initialize(&mut self) -> Result<(), ModelError> {
        self.model.initialize()
    }

    pub fn set_field(&mut self, field: &str, value: &Value) -> Result<(), ModelError> {
        self.model.set_field(field, value)
    }

    pub fn process_event(&mut self, event: &str) -> Result<(), ModelError> {
        self.model.process_event(event)
    }

    pub fn apply_decay(&mut self) -> Result<(), ModelError> {
        self.model.apply_decay()
    }

    pub fn recommended_action(&mut self) -> Result<String, ModelError> {
        self.model.recommended_action()
    }

    /// Advance the model clock, returning how many emulated decay intervals
    /// were applied (always 0 with native support).
    pub fn advance_time(&mut self, seconds: u64) -> Result<u64, ModelError> {
        if self.native_advance {
            self.model.advance_time(seconds)?;
            return Ok(0);
        }
        let intervals = seconds / DECAY_INTERVAL_SECS;
        for _ in 0..intervals {
            self.apply_decay()?;
        }
        Ok(intervals)
    }

    pub fn snapshot(&mut self) -> Result<Value, ModelError> {
        self.model.snapshot()
    }
}
