//! Execution Tactics Errors

use thiserror::Error;

/// A strategy parameter outside its allowed range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("strategy parameter {parameter} {reason}")]
pub struct TacticError {
    /// Offending parameter.
    pub parameter: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl TacticError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            parameter,
            reason: reason.into(),
        }
    }
}
