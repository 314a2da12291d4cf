//! I/O helpers for harness commands.

pub mod config;
pub mod process;
pub mod protocol;
pub mod report_store;
pub mod vector_store;
