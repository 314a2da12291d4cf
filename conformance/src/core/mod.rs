//! Deterministic execution engine.
//!
//! Core modules perform no filesystem access. The implementation under test
//! is reached only through the [`model::StateModel`] trait, so every module
//! here is testable against in-memory models.

pub mod adapter;
pub mod assertion;
pub mod interpreter;
pub mod model;
pub mod outcome;
pub mod path;
pub mod report;
pub mod vector;
