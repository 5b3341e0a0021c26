//! comparison helpers
//!
//! missing data never raises: an absent operand degrades to a presence check.
//! `is nil` / `is not nil` test the left operand only; every other operator
//! is false against an absent operand, except `!=` which is true when exactly
//! one side is present.

use super::types::Operator;

/// compare two optional numbers
pub fn compare(left: Option<f64>, right: Option<f64>, op: Operator) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Lt => l < r,
            Operator::Lte => l <= r,
            Operator::Gt => l > r,
            Operator::Gte => l >= r,
            Operator::IsNil => false,
            Operator::IsNotNil => true,
        },
        _ => compare_absent(left.is_some(), right.is_some(), op),
    }
}

/// exact-match comparison for category strings
pub fn compare_text(left: Option<&str>, right: Option<&str>, op: Operator) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::IsNil => false,
            Operator::IsNotNil => true,
            // rejected at build time
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => false,
        },
        _ => compare_absent(left.is_some(), right.is_some(), op),
    }
}

/// equality comparison for booleans
pub fn compare_bool(left: Option<bool>, right: Option<bool>, op: Operator) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::IsNil => false,
            Operator::IsNotNil => true,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => false,
        },
        _ => compare_absent(left.is_some(), right.is_some(), op),
    }
}

/// outcome when at least one operand is absent
fn compare_absent(left: bool, right: bool, op: Operator) -> bool {
    match op {
        Operator::IsNil => !left,
        Operator::IsNotNil => left,
        Operator::Ne => left != right,
        Operator::Eq | Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => false,
    }
}
