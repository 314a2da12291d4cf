//! Suite orchestration: every vector, in file order, one fresh model each.

use tracing::{debug, info, instrument, warn};

use crate::core::interpreter::execute;
use crate::core::model::ModelFactory;
use crate::core::outcome::{TestResult, TestStatus, classify_outcome};
use crate::core::vector::VectorSuite;

/// Run all vectors sequentially and return one result per vector, in order.
///
/// `on_result` is called after each vector so callers can stream progress;
/// nothing here prints or touches the filesystem.
#[instrument(skip_all, fields(vectors = suite.tests.len(), implementation = %factory.info().name))]
pub fn run_suite<F>(factory: &dyn ModelFactory, suite: &VectorSuite, mut on_result: F) -> Vec<TestResult>
where
    F: FnMut(&TestResult),
{
    info!("suite run started");
    let mut results = Vec::with_capacity(suite.tests.len());
    for vector in &suite.tests {
        let execution = execute(factory, vector);
        if let Ok(execution) = &execution {
            debug!(vector_id = %vector.id, steps_run = execution.steps_run, "vector executed");
        }
        let result = classify_outcome(vector, execution);
        match result.status {
            TestStatus::Passed => info!(vector_id = %result.id, "vector passed"),
            TestStatus::Failed => {
                warn!(vector_id = %result.id, message = ?result.message, "vector failed");
            }
            TestStatus::Error => {
                warn!(vector_id = %result.id, message = ?result.message, "vector errored");
            }
        }
        on_result(&result);
        results.push(result);
    }
    info!(results = results.len(), "suite run complete");
    results
}
