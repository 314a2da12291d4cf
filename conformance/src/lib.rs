//! Conformance harness for pluggable emotional-state models.
//!
//! Test vectors declared in JSON are replayed against an implementation under
//! test and judged against expected values:
//!
//! - **[`core`]**: the execution engine (vector parsing, adapter, step
//!   interpreter, assertion evaluator, aggregation). No filesystem access.
//! - **[`io`]**: side effects (config and vector files, the out-of-process
//!   model protocol, report emission).
//!
//! [`suite`] ties the two together for a whole vector file.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod suite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
