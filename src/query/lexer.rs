//! Tokenizes operator text into [`Operator`] tags.

use crate::query::error::LexError;
use crate::query::operator::Operator;

/// Token table in priority order. The two-character tokens come before the
/// single-character tokens they share a prefix with: matching `>` before
/// `>=` would mis-tokenize `>=` expressions.
const TOKENS: &[(&str, Operator)] = &[
    ("==", Operator::Eq),
    ("!=", Operator::Neq),
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("+", Operator::Add),
    ("-", Operator::Sub),
    ("/", Operator::Div),
    ("*", Operator::Mul),
    (">", Operator::Gt),
    ("<", Operator::Lt),
];

/// Parse one operator off the front of `input`, returning the tag and the
/// unconsumed remainder.
pub fn parse_operator(input: &str) -> Result<(Operator, &str), LexError> {
    for (token, op) in TOKENS {
        if let Some(rest) = input.strip_prefix(token) {
            return Ok((*op, rest));
        }
    }
    Err(LexError {
        text: input.to_string(),
    })
}
