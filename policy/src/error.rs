//! Typed errors raised by the policy core.

use thiserror::Error;

/// Errors signalled by the policy table and the evaluator.
///
/// The only variant is a defect signal: a table that is not total over its
/// enumeration domains, or that violates PIN exclusivity. Tables are validated
/// at construction, so a request should never observe it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid policy configuration: {0}")]
    InvalidConfiguration(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// A string did not name a member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
