//! Condition evaluation
//!
//! Every soft failure (missing fact, failed numeric coercion, unknown
//! operator or group kind) makes the condition false. Nothing here panics
//! and nothing here mutates the facts.

use crate::condition::{Condition, GroupKind, Operator};
use crate::facts::{Facts, Value};
use std::cmp::Ordering;

/// Evaluate a condition tree against a fact mapping
pub fn evaluate_condition(condition: &Condition, facts: &Facts) -> bool {
    match condition {
        Condition::Compare {
            field,
            operator,
            value,
        } => match facts.get(field) {
            Some(actual) => compare(actual, operator, value),
            None => false,
        },
        Condition::Group { kind, conditions } => match kind {
            GroupKind::All => conditions.iter().all(|c| evaluate_condition(c, facts)),
            GroupKind::Any => conditions.iter().any(|c| evaluate_condition(c, facts)),
            GroupKind::Unrecognized(_) => false,
        },
    }
}

/// Apply a single operator to a fact value and the rule's expected value
pub fn compare(actual: &Value, operator: &Operator, expected: &Value) -> bool {
    match operator {
        Operator::Equal => values_equal(actual, expected),
        Operator::NotEqual => !values_equal(actual, expected),
        Operator::LessThan => numeric_ordering(actual, expected) == Some(Ordering::Less),
        Operator::LessThanOrEqual => matches!(
            numeric_ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::GreaterThan => numeric_ordering(actual, expected) == Some(Ordering::Greater),
        Operator::GreaterThanOrEqual => matches!(
            numeric_ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::In => match expected.as_list() {
            Some(items) => items.iter().any(|item| values_equal(actual, item)),
            None => false,
        },
        Operator::NotIn => match expected.as_list() {
            Some(items) => !items.iter().any(|item| values_equal(actual, item)),
            None => false,
        },
        Operator::Unrecognized(_) => false,
    }
}

/// Exact equality without coercion; numbers compare by decimal value
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}

fn numeric_ordering(left: &Value, right: &Value) -> Option<Ordering> {
    let left = left.as_number()?;
    let right = right.as_number()?;
    Some(left.cmp(&right))
}
