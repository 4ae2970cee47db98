//! Structural validation of rule sets
//!
//! Runs once, before an engine exists. Hard problems are collected and
//! returned together; soft problems come back as warnings and the rule set
//! stays usable.

use crate::condition::{Condition, GroupKind, Operator};
use crate::facts::Value;
use crate::{ResourceLimits, RuleSet, SelectionPolicy, Span, TriageError, TriageResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Where a rule set came from, for locating diagnostics
#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub text: Arc<str>,
}

impl Source {
    pub fn new(id: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// A rule set built in code has no text to point into
    pub fn detached(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    /// Span of the first occurrence of `"needle"` (quoted, as it appears in JSON)
    fn locate_quoted(&self, needle: &str) -> Option<Span> {
        Span::locate(&self.text, &format!("\"{}\"", needle))
    }
}

#[derive(Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a rule set; returns the non-fatal warnings on success
    pub fn validate(
        &self,
        rule_set: &RuleSet,
        limits: &ResourceLimits,
        source: &Source,
    ) -> TriageResult<Vec<String>> {
        let mut checker = Checker {
            source,
            limits,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        checker.check(rule_set);
        match TriageError::from_many(checker.errors) {
            Some(error) => Err(error),
            None => Ok(checker.warnings),
        }
    }
}

struct Checker<'a> {
    source: &'a Source,
    limits: &'a ResourceLimits,
    errors: Vec<TriageError>,
    warnings: Vec<String>,
}

impl Checker<'_> {
    fn error(&mut self, message: String, anchor: Option<&str>) {
        let span = anchor.and_then(|a| self.source.locate_quoted(a));
        self.errors.push(TriageError::validation(
            message,
            span,
            self.source.id.clone(),
            self.source.text.clone(),
        ));
    }

    fn error_with_suggestion(&mut self, message: String, anchor: Option<&str>, suggestion: String) {
        let span = anchor.and_then(|a| self.source.locate_quoted(a));
        self.errors.push(TriageError::validation_with_suggestion(
            message,
            span,
            self.source.id.clone(),
            self.source.text.clone(),
            suggestion,
        ));
    }

    fn check(&mut self, rule_set: &RuleSet) {
        if rule_set.rules().is_empty() {
            self.error_with_suggestion(
                format!("Rule set '{}' has no conclusion rules", rule_set.name()),
                None,
                "Add at least one entry to conclusion_rules".to_string(),
            );
        }

        if rule_set.goal_fact().is_empty() {
            self.error("Goal fact name must not be empty".to_string(), Some("goal_fact"));
        }

        match rule_set.max_iterations() {
            Some(0) => self.error(
                "max_iterations must be at least 1".to_string(),
                Some("max_iterations"),
            ),
            None if self.limits.max_iterations == 0
                && !rule_set.intermediate_rules().is_empty() =>
            {
                self.error_with_suggestion(
                    "Engine max_iterations must be at least 1 to run intermediate rules"
                        .to_string(),
                    None,
                    "Raise the engine iteration limit or set max_iterations in the rule set"
                        .to_string(),
                )
            }
            _ => {}
        }

        self.check_ids(rule_set);
        self.check_selection(rule_set);

        for rule in rule_set.rules() {
            if rule.category().trim().is_empty() {
                self.error(
                    format!("Rule '{}' concludes an empty category", rule.id),
                    Some(rule.id.as_str()),
                );
            }
            self.check_conditions(&rule.id, &rule.conditions);
        }

        for rule in rule_set.intermediate_rules() {
            if rule.derived_facts.is_empty() {
                self.error_with_suggestion(
                    format!("Intermediate rule '{}' derives no facts", rule.id),
                    Some(rule.id.as_str()),
                    "Add at least one entry to derived_facts".to_string(),
                );
            }
            self.check_conditions(&rule.id, &rule.conditions);
        }
    }

    fn check_ids(&mut self, rule_set: &RuleSet) {
        let ids = rule_set
            .rules()
            .iter()
            .map(|r| r.id.as_str())
            .chain(rule_set.intermediate_rules().iter().map(|r| r.id.as_str()));
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let mut empty = false;
        for id in ids {
            if id.trim().is_empty() {
                empty = true;
            } else if !seen.insert(id) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        if empty {
            self.error("Rule id must not be empty".to_string(), None);
        }
        for id in duplicates {
            self.error(format!("Duplicate rule id '{}'", id), Some(id));
        }
    }

    fn check_selection(&mut self, rule_set: &RuleSet) {
        let SelectionPolicy::Staged { category_order } = rule_set.selection() else {
            return;
        };

        if category_order.is_empty() {
            self.error(
                "Staged selection needs a non-empty category_order".to_string(),
                Some("category_order"),
            );
            return;
        }

        let mut seen = HashSet::new();
        for category in category_order {
            if !seen.insert(category.as_str()) {
                self.error(
                    format!("Category '{}' appears more than once in category_order", category),
                    Some("category_order"),
                );
            }
        }

        for rule in rule_set.rules() {
            if !seen.contains(rule.category()) {
                self.error_with_suggestion(
                    format!(
                        "Rule '{}' concludes category '{}', which is not in category_order",
                        rule.id,
                        rule.category()
                    ),
                    Some(rule.id.as_str()),
                    format!("Use one of: {}", category_order.join(", ")),
                );
            }
        }
    }

    fn check_conditions(&mut self, rule_id: &str, conditions: &[Condition]) {
        for condition in conditions {
            let depth = condition.depth();
            if depth > self.limits.max_condition_depth {
                self.errors.push(TriageError::ResourceLimitExceeded {
                    limit_name: "max_condition_depth".to_string(),
                    limit_value: self.limits.max_condition_depth.to_string(),
                    actual_value: depth.to_string(),
                    suggestion: format!(
                        "Flatten the conditions of rule '{}' to {} levels or fewer",
                        rule_id, self.limits.max_condition_depth
                    ),
                });
            }
            self.check_condition(rule_id, condition);
        }
    }

    fn check_condition(&mut self, rule_id: &str, condition: &Condition) {
        match condition {
            Condition::Compare {
                field,
                operator,
                value,
            } => {
                if let Some(warning) = comparison_warning(field, operator, value) {
                    self.warnings.push(format!("Rule '{}': {}", rule_id, warning));
                }
            }
            Condition::Group { kind, conditions } => {
                if let GroupKind::Unrecognized(name) = kind {
                    self.warnings.push(format!(
                        "Rule '{}': unrecognized condition group '{}' always evaluates to false",
                        rule_id, name
                    ));
                }
                for nested in conditions {
                    self.check_condition(rule_id, nested);
                }
            }
        }
    }
}

fn comparison_warning(field: &str, operator: &Operator, value: &Value) -> Option<String> {
    match operator {
        Operator::Unrecognized(symbol) => Some(format!(
            "unrecognized operator '{}' on '{}' always evaluates to false",
            symbol, field
        )),
        op if op.is_membership() && value.as_list().is_none() => Some(format!(
            "'{}' on '{}' expects a list but got {}; the condition is always false",
            op,
            field,
            value.type_name()
        )),
        op if op.is_relational() && value.as_number().is_none() => Some(format!(
            "'{}' on '{}' compares against non-numeric {}; the condition is always false",
            op,
            field,
            value.type_name()
        )),
        _ => None,
    }
}
