//! Deterministic, pure policy logic.
//!
//! Core modules must be free of I/O side effects. They operate on immutable
//! in-memory tables and return deterministic outputs suitable for tests.

pub mod evaluator;
pub mod invariants;
pub mod table;
pub mod types;
