//! Error taxonomy for program evaluation
//!
//! Two channels, kept apart on purpose:
//! - `ExecutionError` is a runtime fault (division by zero and friends)
//!   that aborts the current statement.
//! - `StaticError` is a type violation carried as a value, so a
//!   scheduler can tell cheap, analysable type errors apart from
//!   exceptional numeric events.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of evaluating an operator or an expression.
pub type EvalResult = Result<Value, EvalError>;

/// Runtime faults raised by arithmetic that cannot complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ExecutionError {
    /// Division where the divisor is zero.
    #[error("attempted to divide by zero")]
    DivideByZero,

    /// Modulus where the divisor is zero.
    #[error("attempted to modulus by zero")]
    ModulusByZero,

    /// Decrement of an empty string.
    #[error("attempted to decrement an empty string")]
    EmptyString,
}

/// A type violation, propagated as a value rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StaticError {
    pub message: String,
}

impl StaticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Either evaluation channel. Callers that only need "did this
/// statement halt" can match on the outer variant; the two kinds are
/// never collapsed into one another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum EvalError {
    #[error(transparent)]
    Runtime(#[from] ExecutionError),

    #[error(transparent)]
    Static(#[from] StaticError),
}

impl EvalError {
    /// True for the runtime channel.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// True for the type-violation channel.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// Failure to parse a number literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid number literal: {text:?}")]
pub struct ParseNumberError {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        assert_eq!(
            ExecutionError::DivideByZero.to_string(),
            "attempted to divide by zero"
        );
        assert_eq!(
            ExecutionError::ModulusByZero.to_string(),
            "attempted to modulus by zero"
        );
        assert_eq!(
            ExecutionError::EmptyString.to_string(),
            "attempted to decrement an empty string"
        );
    }

    #[test]
    fn test_static_error_carries_message() {
        let err = StaticError::new("Attempted to multiply by a string");
        assert_eq!(err.to_string(), "Attempted to multiply by a string");
    }

    #[test]
    fn test_eval_error_channels() {
        let runtime = EvalError::from(ExecutionError::DivideByZero);
        assert!(runtime.is_runtime());
        assert!(!runtime.is_static());

        let static_err = EvalError::from(StaticError::new("Attempted to negate a string"));
        assert!(static_err.is_static());
        assert_eq!(static_err.to_string(), "Attempted to negate a string");
    }

    #[test]
    fn test_parse_number_error_display() {
        let err = ParseNumberError {
            text: "banana".to_string(),
        };
        assert_eq!(err.to_string(), "invalid number literal: \"banana\"");
    }

    #[test]
    fn test_eval_error_serde_round_trip() {
        let err = EvalError::from(ExecutionError::ModulusByZero);
        let json = serde_json::to_string(&err).expect("serialize");
        let back: EvalError = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, err);
    }
}
