//! Error types for the two strata of the arithmetic core: building a
//! composed evaluator and invoking one.

use crate::query::operator::Operator;
use crate::query::value::Kind;
use thiserror::Error;

/// The underlying reason an evaluation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalCause {
    /// A value of a kind outside the numeric domain reached coercion.
    #[error("expected a numerical value, got {0}")]
    NonNumeric(Kind),

    /// Text that does not parse as a number.
    #[error("failed to parse {0:?} as a number")]
    BadNumber(String),

    /// Failure reported by an external operand evaluator.
    #[error("{0}")]
    Other(String),
}

/// A failed evaluator call.
///
/// `Fatal` carries no usable value. `Recoverable` carries the original cause
/// plus a best-effort fallback the caller may substitute to keep processing
/// the row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{0}")]
    Fatal(EvalCause),

    #[error("{cause} (recovered {fallback})")]
    Recoverable { cause: Box<EvalError>, fallback: f64 },
}

impl EvalError {
    /// Shorthand for an operand-supplied fatal failure.
    pub fn other(msg: impl Into<String>) -> Self {
        EvalError::Fatal(EvalCause::Other(msg.into()))
    }

    /// Wrap a failure with the best-effort value computed so far.
    pub fn recoverable(cause: EvalError, fallback: f64) -> Self {
        EvalError::Recoverable {
            cause: Box::new(cause),
            fallback,
        }
    }

    /// True if a fallback value is available.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EvalError::Recoverable { .. })
    }

    /// The fallback value, when one exists.
    pub fn recovered(&self) -> Option<f64> {
        match self {
            EvalError::Recoverable { fallback, .. } => Some(*fallback),
            EvalError::Fatal(_) => None,
        }
    }

    /// Strip any fallback, leaving only the underlying failure.
    pub fn into_fatal(self) -> EvalError {
        match self {
            EvalError::Recoverable { cause, .. } => cause.into_fatal(),
            fatal => fatal,
        }
    }
}

/// Result type for evaluator calls.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while building a composed evaluator from parsed input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("mismatch of operands to arithmetic operators: {operands} operands, {operators} operators")]
    CountMismatch { operands: usize, operators: usize },

    #[error("operator not supported for comparison: {0}")]
    UnsupportedOperator(Operator),
}

/// Result type for construction-time operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Raised when operator text matches none of the known tokens.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("operator not recognized: {text:?}")]
pub struct LexError {
    pub text: String,
}
