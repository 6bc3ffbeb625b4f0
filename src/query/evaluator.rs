//! The execution contract shared by operand and composed evaluators.

use crate::message::Message;
use crate::query::error::EvalResult;
use crate::query::value::Value;
use std::sync::Arc;

/// A compiled sub-expression, invoked once per row.
///
/// Implementations are side-effect free: they hold no mutable state and only
/// read from the message passed at call time, so a single evaluator may be
/// invoked concurrently across rows by parallel workers. The `legacy` flag
/// is forwarded unchanged to operand evaluators; this crate never branches
/// on it.
pub trait Evaluator: Send + Sync {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value>;
}

/// Shared handle to an evaluator.
///
/// Composed nodes exclusively own their handles, but the evaluators behind
/// them may be shared by multiple parents. Construction is strictly
/// bottom-up, so no reference cycle can form.
pub type Operand = Arc<dyn Evaluator>;

/// Evaluator yielding a fixed value for every row.
pub struct Literal {
    value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Shorthand for a shared literal operand.
    pub fn operand(value: Value) -> Operand {
        Arc::new(Self::new(value))
    }
}

impl Evaluator for Literal {
    fn eval(&self, _index: usize, _msg: &dyn Message, _legacy: bool) -> EvalResult<Value> {
        Ok(self.value.clone())
    }
}

struct Closure<F> {
    f: F,
}

impl<F> Evaluator for Closure<F>
where
    F: Fn(usize, &dyn Message, bool) -> EvalResult<Value> + Send + Sync,
{
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        (self.f)(index, msg, legacy)
    }
}

/// Wrap a plain closure as an operand evaluator.
pub fn closure<F>(f: F) -> Operand
where
    F: Fn(usize, &dyn Message, bool) -> EvalResult<Value> + Send + Sync + 'static,
{
    Arc::new(Closure { f })
}
