//! Expression core for streaming field-transformation queries.
//!
//! This crate resolves a parsed arithmetic/comparison sub-expression into a
//! single composed evaluator, invoked once per message at runtime. The
//! surrounding query compiler supplies the operand evaluators (field
//! selectors, literals, function calls) and the operator tags between them;
//! this core owns precedence, associativity, numeric coercion, and the
//! recoverable/fatal error model.

pub mod message;
pub mod query;
