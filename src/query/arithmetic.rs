//! Binary operation builders and the precedence resolver.
//!
//! The resolver consumes a flat operand/operator sequence produced by the
//! surrounding parser and folds it into one composed evaluator. Precedence
//! is `*`,`/` over `+`,`-` over comparisons, all left-associative, with
//! comparisons splitting at the leftmost occurrence rather than chaining.

use crate::message::Message;
use crate::query::error::{EvalError, EvalResult, ResolveError, ResolveResult};
use crate::query::evaluator::{Evaluator, Operand};
use crate::query::operator::Operator;
use crate::query::value::Value;
use std::sync::Arc;

/// Sum of any number of operands.
///
/// Every operand is evaluated for the row, even after an earlier failure.
/// Operands that fail contribute nothing; the last failure in sequence
/// order becomes the recorded cause and the partial sum the fallback.
struct Sum {
    operands: Vec<Operand>,
}

impl Evaluator for Sum {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        let mut total = 0.0;
        let mut err: Option<EvalError> = None;

        for operand in &self.operands {
            match operand.eval(index, msg, legacy).and_then(|v| v.to_float()) {
                Ok(next) => total += next,
                Err(e) => err = Some(e),
            }
        }

        match err {
            Some(cause) => Err(EvalError::recoverable(cause, total)),
            None => Ok(Value::Float(total)),
        }
    }
}

/// Left operand minus right operand.
///
/// The running total starts at zero, so a failing left side leaves the
/// fallback at whatever the right side subtracted. An rhs failure
/// overwrites a recorded lhs failure.
struct Difference {
    lhs: Operand,
    rhs: Operand,
}

impl Evaluator for Difference {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        let mut total = 0.0;
        let mut err: Option<EvalError> = None;

        match self.lhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(left) => total = left,
            Err(e) => err = Some(e),
        }
        match self.rhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(right) => total -= right,
            Err(e) => err = Some(e),
        }

        match err {
            Some(cause) => Err(EvalError::recoverable(cause, total)),
            None => Ok(Value::Float(total)),
        }
    }
}

/// Product of two operands. Partial state is discarded on failure.
struct Product {
    lhs: Operand,
    rhs: Operand,
}

impl Evaluator for Product {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        let mut result = 0.0;
        let mut err: Option<EvalError> = None;

        match self.lhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(left) => result = left,
            Err(e) => err = Some(e),
        }
        match self.rhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(right) => result *= right,
            Err(e) => err = Some(e),
        }

        match err {
            Some(e) => Err(e.into_fatal()),
            None => Ok(Value::Float(result)),
        }
    }
}

/// Quotient of two operands. Partial state is discarded on failure.
///
/// A zero divisor is not an error: the division follows IEEE semantics and
/// yields infinity or NaN.
struct Quotient {
    lhs: Operand,
    rhs: Operand,
}

impl Evaluator for Quotient {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        let mut result = 0.0;
        let mut err: Option<EvalError> = None;

        match self.lhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(left) => result = left,
            Err(e) => err = Some(e),
        }
        match self.rhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(right) => result /= right,
            Err(e) => err = Some(e),
        }

        match err {
            Some(e) => Err(e.into_fatal()),
            None => Ok(Value::Float(result)),
        }
    }
}

/// Numeric comparison of two operands, comparator fixed at construction.
struct Comparison {
    cmp: fn(f64, f64) -> bool,
    lhs: Operand,
    rhs: Operand,
}

impl Evaluator for Comparison {
    fn eval(&self, index: usize, msg: &dyn Message, legacy: bool) -> EvalResult<Value> {
        let mut left = 0.0;
        let mut right = 0.0;
        let mut err: Option<EvalError> = None;

        match self.lhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(l) => left = l,
            Err(e) => err = Some(e),
        }
        match self.rhs.eval(index, msg, legacy).and_then(|v| v.to_float()) {
            Ok(r) => right = r,
            Err(e) => err = Some(e),
        }

        match err {
            Some(e) => Err(e.into_fatal()),
            None => Ok(Value::Bool((self.cmp)(left, right))),
        }
    }
}

/// Sum every operand for the row. Failures are recoverable, with the sum of
/// the operands that did succeed as the fallback.
pub fn add(operands: Vec<Operand>) -> Operand {
    Arc::new(Sum { operands })
}

/// Subtract `rhs` from `lhs`. Failures are recoverable, with the partial
/// total as the fallback.
pub fn sub(lhs: Operand, rhs: Operand) -> Operand {
    Arc::new(Difference { lhs, rhs })
}

/// Multiply `lhs` by `rhs`. Failures are fatal.
pub fn multiply(lhs: Operand, rhs: Operand) -> Operand {
    Arc::new(Product { lhs, rhs })
}

/// Divide `lhs` by `rhs`. Failures are fatal; a zero divisor follows IEEE
/// semantics rather than failing.
pub fn divide(lhs: Operand, rhs: Operand) -> Operand {
    Arc::new(Quotient { lhs, rhs })
}

/// Compare `lhs` and `rhs` with `op`, which must be one of the comparison
/// operators. Construction fails on any other tag; evaluation failures are
/// fatal.
pub fn compare(lhs: Operand, rhs: Operand, op: Operator) -> ResolveResult<Operand> {
    let cmp: fn(f64, f64) -> bool = match op {
        Operator::Eq => |l, r| l == r,
        Operator::Neq => |l, r| l != r,
        Operator::Gt => |l, r| l > r,
        Operator::Gte => |l, r| l >= r,
        Operator::Lt => |l, r| l < r,
        Operator::Lte => |l, r| l <= r,
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => {
            return Err(ResolveError::UnsupportedOperator(op))
        }
    };
    Ok(Arc::new(Comparison { cmp, lhs, rhs }))
}

/// Fold parallel operand/operator sequences into one composed evaluator.
///
/// The operator sequence must be exactly one shorter than the operand
/// sequence. Two non-mutating passes run over the input: the first folds
/// multiplication and division left to right, the second groups additions
/// and subtractions into piles and splits at the leftmost comparison.
pub fn resolve(operands: &[Operand], operators: &[Operator]) -> ResolveResult<Operand> {
    if operands.len() == 1 && operators.is_empty() {
        return Ok(operands[0].clone());
    }
    if operands.len() != operators.len() + 1 {
        return Err(ResolveError::CountMismatch {
            operands: operands.len(),
            operators: operators.len(),
        });
    }

    log::debug!(
        "resolving arithmetic expression: {} operands, operators {:?}",
        operands.len(),
        operators
    );

    // First pass: fold multiplication and division onto the previous
    // evaluator, left to right, so `a / b / c` builds ((a / b) / c).
    let mut fns: Vec<Operand> = vec![operands[0].clone()];
    let mut ops: Vec<Operator> = Vec::new();
    for (i, op) in operators.iter().enumerate() {
        let next = operands[i + 1].clone();
        match op {
            Operator::Mul => {
                let last = fns.len() - 1;
                fns[last] = multiply(fns[last].clone(), next);
            }
            Operator::Div => {
                let last = fns.len() - 1;
                fns[last] = divide(fns[last].clone(), next);
            }
            _ => {
                fns.push(next);
                ops.push(*op);
            }
        }
    }
    if fns.len() == 1 {
        return Ok(fns.remove(0));
    }

    // Second pass: group additions and subtractions into piles. The first
    // comparison operator splits the whole expression there; any further
    // comparisons resolve inside the recursive right-hand call.
    let mut add_pile: Vec<Operand> = vec![fns[0].clone()];
    let mut sub_pile: Vec<Operand> = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        match op {
            Operator::Add => add_pile.push(fns[i + 1].clone()),
            Operator::Sub => sub_pile.push(fns[i + 1].clone()),
            op if op.is_comparison() => {
                let lhs = resolve(&fns[..i + 1], &ops[..i])?;
                let rhs = resolve(&fns[i + 1..], &ops[i + 1..])?;
                return compare(lhs, rhs, *op);
            }
            // Multiplication and division were consumed by the first pass.
            _ => {}
        }
    }

    let summed = add(add_pile);
    if sub_pile.is_empty() {
        Ok(summed)
    } else {
        Ok(sub(summed, add(sub_pile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MemoryMessage;
    use crate::query::error::EvalCause;
    use crate::query::evaluator::{closure, Literal};
    use crate::query::value::Kind;

    fn lit(n: f64) -> Operand {
        Literal::operand(Value::Float(n))
    }

    fn failing(msg: &str) -> Operand {
        let msg = msg.to_string();
        closure(move |_, _, _| Err(EvalError::other(msg.clone())))
    }

    fn eval(operand: &Operand) -> EvalResult<Value> {
        operand.eval(0, &MemoryMessage::default(), false)
    }

    #[test]
    fn test_add_sums_all_operands() {
        let sum = add(vec![lit(1.0), lit(2.0), lit(3.5)]);
        assert_eq!(eval(&sum), Ok(Value::Float(6.5)));
    }

    #[test]
    fn test_add_coerces_mixed_kinds() {
        let sum = add(vec![
            Literal::operand(Value::Int(2)),
            Literal::operand(Value::String("0.5".to_string())),
        ]);
        assert_eq!(eval(&sum), Ok(Value::Float(2.5)));
    }

    #[test]
    fn test_add_recovers_with_partial_sum() {
        let sum = add(vec![lit(1.0), failing("middle"), lit(2.0)]);
        assert_eq!(
            eval(&sum),
            Err(EvalError::recoverable(EvalError::other("middle"), 3.0))
        );
    }

    #[test]
    fn test_add_last_error_wins() {
        let sum = add(vec![failing("first"), lit(4.0), failing("second")]);
        assert_eq!(
            eval(&sum),
            Err(EvalError::recoverable(EvalError::other("second"), 4.0))
        );
    }

    #[test]
    fn test_add_records_coercion_failures() {
        let sum = add(vec![lit(1.0), Literal::operand(Value::Bool(true))]);
        assert_eq!(
            eval(&sum),
            Err(EvalError::recoverable(
                EvalError::Fatal(EvalCause::NonNumeric(Kind::Bool)),
                1.0
            ))
        );
    }

    #[test]
    fn test_sub_exact_difference() {
        let diff = sub(lit(10.0), lit(3.5));
        assert_eq!(eval(&diff), Ok(Value::Float(6.5)));
    }

    #[test]
    fn test_sub_lhs_failure_leaves_zero_total() {
        let diff = sub(failing("left"), lit(3.0));
        assert_eq!(
            eval(&diff),
            Err(EvalError::recoverable(EvalError::other("left"), -3.0))
        );
    }

    #[test]
    fn test_sub_rhs_failure_overwrites_lhs_error() {
        let diff = sub(failing("left"), failing("right"));
        assert_eq!(
            eval(&diff),
            Err(EvalError::recoverable(EvalError::other("right"), 0.0))
        );
    }

    #[test]
    fn test_sub_rhs_failure_keeps_lhs_total() {
        let diff = sub(lit(7.0), failing("right"));
        assert_eq!(
            eval(&diff),
            Err(EvalError::recoverable(EvalError::other("right"), 7.0))
        );
    }

    #[test]
    fn test_multiply_and_divide() {
        assert_eq!(eval(&multiply(lit(4.0), lit(2.5))), Ok(Value::Float(10.0)));
        assert_eq!(eval(&divide(lit(9.0), lit(2.0))), Ok(Value::Float(4.5)));
    }

    #[test]
    fn test_multiply_failure_is_fatal() {
        let product = multiply(lit(4.0), failing("right"));
        assert_eq!(eval(&product), Err(EvalError::other("right")));
    }

    #[test]
    fn test_divide_failure_is_fatal_with_no_fallback() {
        let quotient = divide(lit(10.0), failing("denominator"));
        let err = eval(&quotient).unwrap_err();
        assert_eq!(err, EvalError::other("denominator"));
        assert_eq!(err.recovered(), None);
    }

    #[test]
    fn test_fatal_ops_strip_recoverable_operand_errors() {
        // A recoverable failure inside an operand must not leak its
        // fallback through an operator documented as fatal.
        let inner = add(vec![lit(1.0), failing("inner")]);
        let quotient = divide(inner, lit(2.0));
        assert_eq!(eval(&quotient), Err(EvalError::other("inner")));
    }

    #[test]
    fn test_divide_by_zero_follows_ieee() {
        assert_eq!(
            eval(&divide(lit(1.0), lit(0.0))),
            Ok(Value::Float(f64::INFINITY))
        );
        assert_eq!(
            eval(&divide(lit(-1.0), lit(0.0))),
            Ok(Value::Float(f64::NEG_INFINITY))
        );
        match eval(&divide(lit(0.0), lit(0.0))) {
            Ok(Value::Float(f)) => assert!(f.is_nan()),
            other => panic!("expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn test_compare_rejects_non_comparison_tags() {
        for op in [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div] {
            assert_eq!(
                compare(lit(1.0), lit(2.0), op).err(),
                Some(ResolveError::UnsupportedOperator(op))
            );
        }
    }

    #[test]
    fn test_compare_each_comparator() {
        let cases = [
            (Operator::Eq, 2.0, 2.0, true),
            (Operator::Eq, 2.0, 3.0, false),
            (Operator::Neq, 2.0, 3.0, true),
            (Operator::Gt, 3.0, 2.0, true),
            (Operator::Gt, 2.0, 2.0, false),
            (Operator::Gte, 2.0, 2.0, true),
            (Operator::Lt, 2.0, 3.0, true),
            (Operator::Lte, 3.0, 3.0, true),
            (Operator::Lte, 4.0, 3.0, false),
        ];
        for (op, l, r, expected) in cases {
            let cmp = compare(lit(l), lit(r), op).unwrap();
            assert_eq!(eval(&cmp), Ok(Value::Bool(expected)), "{} {} {}", l, op, r);
        }
    }

    #[test]
    fn test_compare_failure_is_fatal() {
        let cmp = compare(lit(1.0), failing("right"), Operator::Eq).unwrap();
        assert_eq!(eval(&cmp), Err(EvalError::other("right")));
    }

    #[test]
    fn test_resolve_single_operand_passes_through() {
        let operand = lit(7.0);
        let resolved = resolve(&[operand.clone()], &[]).unwrap();
        assert!(Arc::ptr_eq(&operand, &resolved));
    }

    #[test]
    fn test_resolve_count_mismatch() {
        assert_eq!(
            resolve(&[], &[]).err(),
            Some(ResolveError::CountMismatch {
                operands: 0,
                operators: 0
            })
        );
        assert_eq!(
            resolve(&[lit(1.0), lit(2.0)], &[]).err(),
            Some(ResolveError::CountMismatch {
                operands: 2,
                operators: 0
            })
        );
        assert_eq!(
            resolve(&[lit(1.0)], &[Operator::Add]).err(),
            Some(ResolveError::CountMismatch {
                operands: 1,
                operators: 1
            })
        );
    }

    #[test]
    fn test_resolve_multiplicative_precedence() {
        // 2 + 3 * 4 = 14
        let resolved = resolve(
            &[lit(2.0), lit(3.0), lit(4.0)],
            &[Operator::Add, Operator::Mul],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Float(14.0)));

        // 2 * 3 + 4 = 10
        let resolved = resolve(
            &[lit(2.0), lit(3.0), lit(4.0)],
            &[Operator::Mul, Operator::Add],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Float(10.0)));
    }

    #[test]
    fn test_resolve_division_left_associative() {
        // 8 / 2 / 2 = 2, not 8
        let resolved = resolve(
            &[lit(8.0), lit(2.0), lit(2.0)],
            &[Operator::Div, Operator::Div],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_resolve_subtraction_left_associative() {
        // 10 - 3 - 2 = 5, not 9
        let resolved = resolve(
            &[lit(10.0), lit(3.0), lit(2.0)],
            &[Operator::Sub, Operator::Sub],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Float(5.0)));
    }

    #[test]
    fn test_resolve_regroups_additive_piles() {
        // 1 - 2 + 3 = 2 via (1 + 3) - (2)
        let resolved = resolve(
            &[lit(1.0), lit(2.0), lit(3.0)],
            &[Operator::Sub, Operator::Add],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_resolve_comparison_is_lowest_precedence() {
        // 1 + 1 == 2
        let resolved = resolve(
            &[lit(1.0), lit(1.0), lit(2.0)],
            &[Operator::Add, Operator::Eq],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Bool(true)));

        // 2 * 3 > 5
        let resolved = resolve(
            &[lit(2.0), lit(3.0), lit(5.0)],
            &[Operator::Mul, Operator::Gt],
        )
        .unwrap();
        assert_eq!(eval(&resolved), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_resolve_splits_at_leftmost_comparison() {
        // 1 == 1 == 0 splits as 1 == (1 == 0); the inner comparison yields
        // a boolean, which then fails numeric coercion fatally.
        let resolved = resolve(
            &[lit(1.0), lit(1.0), lit(0.0)],
            &[Operator::Eq, Operator::Eq],
        )
        .unwrap();
        assert_eq!(
            eval(&resolved),
            Err(EvalError::Fatal(EvalCause::NonNumeric(Kind::Bool)))
        );
    }

    #[test]
    fn test_resolve_recoverable_flows_to_caller() {
        // 1 + missing: the composed evaluator surfaces the fallback.
        let resolved = resolve(&[lit(1.0), failing("missing")], &[Operator::Add]).unwrap();
        let err = eval(&resolved).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.recovered(), Some(1.0));
    }
}
