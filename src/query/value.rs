//! Dynamic values exchanged between operand evaluators and the arithmetic
//! core, and the numeric coercion applied to them.

use crate::query::error::{EvalCause, EvalError, EvalResult};
use bytes::Bytes;
use std::fmt;

/// Kinds a [`Value`] can take, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Bytes,
    String,
}

impl Kind {
    /// Get the display string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bytes => "bytes",
            Kind::String => "string",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values produced by evaluator calls
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Bytes),
    String(String),
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Bytes(_) => Kind::Bytes,
            Value::String(_) => Kind::String,
        }
    }

    /// Coerce this value to a 64-bit float.
    ///
    /// Integers widen, floats pass through, and text is parsed with standard
    /// decimal/exponent syntax. Booleans are not numbers; every remaining
    /// kind fails with the kind that was observed.
    pub fn to_float(&self) -> EvalResult<f64> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| EvalError::Fatal(EvalCause::BadNumber(s.clone()))),
            other => Err(EvalError::Fatal(EvalCause::NonNumeric(other.kind()))),
        }
    }
}
