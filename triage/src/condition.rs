use crate::facts::{Facts, Value};
use serde::Serialize;
use std::fmt;

/// Comparison operators usable in a condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    NotIn,
    /// Loaded from a definition but not understood; always evaluates to false
    Unrecognized(String),
}

impl Operator {
    /// Parse an operator symbol as written in rule definitions.
    ///
    /// The typographic forms `≤`, `≥` and `≠` are accepted as aliases.
    /// Anything else becomes `Unrecognized`.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol.trim() {
            "==" | "=" => Operator::Equal,
            "!=" | "≠" => Operator::NotEqual,
            "<" => Operator::LessThan,
            "<=" | "≤" => Operator::LessThanOrEqual,
            ">" => Operator::GreaterThan,
            ">=" | "≥" => Operator::GreaterThanOrEqual,
            "in" => Operator::In,
            "not_in" | "not in" => Operator::NotIn,
            other => Operator::Unrecognized(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Unrecognized(symbol) => symbol,
        }
    }

    /// Returns true for `<`, `<=`, `>` and `>=`
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
        )
    }

    /// Returns true for `in` and `not_in`
    pub fn is_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How the members of a condition group are combined
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    All,
    Any,
    /// Loaded from a definition but not understood; always evaluates to false
    Unrecognized(String),
}

impl GroupKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "AND" | "ALL" => GroupKind::All,
            "OR" | "ANY" => GroupKind::Any,
            _ => GroupKind::Unrecognized(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GroupKind::All => "AND",
            GroupKind::Any => "OR",
            GroupKind::Unrecognized(name) => name,
        }
    }
}

/// A single test against the facts, or a boolean group of tests
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        operator: Operator,
        value: Value,
    },
    Group {
        kind: GroupKind,
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// Create a comparison; the field name is normalized like a fact name
    pub fn compare(field: impl AsRef<str>, operator: Operator, value: impl Into<Value>) -> Self {
        Condition::Compare {
            field: Facts::normalize_key(field.as_ref()),
            operator,
            value: value.into(),
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            kind: GroupKind::All,
            conditions,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            kind: GroupKind::Any,
            conditions,
        }
    }

    /// Nesting depth; a plain comparison has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Condition::Compare { .. } => 1,
            Condition::Group { conditions, .. } => {
                1 + conditions.iter().map(Condition::depth).max().unwrap_or(0)
            }
        }
    }

    /// Visit every comparison in this condition tree, depth first
    pub fn for_each_comparison<'a>(
        &'a self,
        visit: &mut impl FnMut(&'a str, &'a Operator, &'a Value),
    ) {
        match self {
            Condition::Compare {
                field,
                operator,
                value,
            } => visit(field.as_str(), operator, value),
            Condition::Group { conditions, .. } => {
                for condition in conditions {
                    condition.for_each_comparison(visit);
                }
            }
        }
    }

    /// Evaluate against a fact mapping. Never fails; see `evaluator::condition`.
    pub fn evaluate(&self, facts: &Facts) -> bool {
        crate::evaluator::condition::evaluate_condition(self, facts)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare {
                field,
                operator,
                value,
            } => write!(f, "{} {} {}", field, operator, value.literal()),
            Condition::Group { kind, conditions } => {
                let joiner = format!(" {} ", kind.name());
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(&joiner))
            }
        }
    }
}
