//! Card action policy engine.
//!
//! Decides which actions a payment card may perform given its classification,
//! lifecycle state and whether a PIN is set. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (policy table, invariants,
//!   evaluator). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (policy table files, instrument
//!   lookup). Isolated behind traits so tests can substitute them.
//!
//! [`service`] couples a resolver with the evaluator for request handlers.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
