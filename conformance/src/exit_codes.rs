//! Stable exit codes for the conformance CLI.

/// Every vector passed.
pub const OK: i32 = 0;
/// At least one vector failed or errored, or the run could not complete.
pub const FAILED: i32 = 1;
