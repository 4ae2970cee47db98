//! Rule sets: an immutable knowledge base of conclusion and intermediate rules
//!
//! A rule set is built once (by the loader or the builder methods below),
//! validated, and then shared read-only behind an `Arc`. Authorship order of
//! both collections is preserved; it is the tie-break between rules of equal
//! priority.

use crate::rule::{IntermediateRule, Rule};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the fact asserted when forward chaining reaches a conclusion
pub const DEFAULT_GOAL_FACT: &str = "final_category";

/// How a single conclusion is chosen among matching rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest priority wins; equal priorities go to the first rule authored
    #[default]
    Priority,
    /// Categories are checked most severe first and the first category with
    /// a match wins, whatever the priorities of less severe rules
    Staged { category_order: Vec<String> },
}

impl SelectionPolicy {
    pub fn staged<I, S>(category_order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectionPolicy::Staged {
            category_order: category_order.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SelectionPolicy::Priority => "priority",
            SelectionPolicy::Staged { .. } => "staged",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    name: String,
    selection: SelectionPolicy,
    goal_fact: String,
    max_iterations: Option<usize>,
    rules: Vec<Rule>,
    intermediate_rules: Vec<IntermediateRule>,
    warnings: Vec<String>,
}

/// Lowest and highest conclusion-rule priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityRange {
    pub min: i64,
    pub max: i64,
}

/// Aggregate counts describing a rule set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub name: String,
    pub selection: String,
    pub total_rules: usize,
    pub total_intermediate_rules: usize,
    pub counts_by_category: BTreeMap<String, usize>,
    pub counts_by_priority: BTreeMap<i64, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_range: Option<PriorityRange>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection: SelectionPolicy::Priority,
            goal_fact: DEFAULT_GOAL_FACT.to_string(),
            max_iterations: None,
            rules: Vec::new(),
            intermediate_rules: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_goal_fact(mut self, goal_fact: impl AsRef<str>) -> Self {
        self.goal_fact = crate::Facts::normalize_key(goal_fact.as_ref());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn add_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_intermediate_rule(mut self, rule: IntermediateRule) -> Self {
        self.intermediate_rules.push(rule);
        self
    }

    pub(crate) fn set_warnings(&mut self, warnings: Vec<String>) {
        self.warnings = warnings;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selection(&self) -> &SelectionPolicy {
        &self.selection
    }

    pub fn goal_fact(&self) -> &str {
        &self.goal_fact
    }

    /// Per-rule-set iteration cap, if one was configured
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    /// Conclusion rules in authorship order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Intermediate rules in authorship order
    pub fn intermediate_rules(&self) -> &[IntermediateRule] {
        &self.intermediate_rules
    }

    /// True when the rule set has no intermediate rules and runs in a single pass
    pub fn is_simple(&self) -> bool {
        self.intermediate_rules.is_empty()
    }

    /// Non-fatal problems found while loading
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn intermediate_rule(&self, id: &str) -> Option<&IntermediateRule> {
        self.intermediate_rules.iter().find(|r| r.id == id)
    }

    pub fn rules_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.category() == category)
    }

    /// Every field named by any condition, sorted and deduplicated
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = BTreeSet::new();
        let conditions = self
            .rules
            .iter()
            .flat_map(|r| r.conditions.iter())
            .chain(self.intermediate_rules.iter().flat_map(|r| r.conditions.iter()));
        for condition in conditions {
            condition.for_each_comparison(&mut |field, _, _| {
                fields.insert(field.to_string());
            });
        }
        fields.into_iter().collect()
    }

    /// Fields that intermediate rules assert during a run
    pub fn derived_fields(&self) -> Vec<String> {
        let fields: BTreeSet<String> = self
            .intermediate_rules
            .iter()
            .flat_map(|r| r.derived_facts.names().cloned())
            .collect();
        fields.into_iter().collect()
    }

    /// Referenced fields a caller has to supply: not derived, not the goal
    pub fn input_fields(&self) -> Vec<String> {
        let derived = self.derived_fields();
        self.referenced_fields()
            .into_iter()
            .filter(|f| !derived.contains(f) && f != &self.goal_fact)
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        let mut counts_by_category = BTreeMap::new();
        let mut counts_by_priority = BTreeMap::new();
        for rule in &self.rules {
            *counts_by_category
                .entry(rule.category().to_string())
                .or_insert(0) += 1;
            *counts_by_priority.entry(rule.priority).or_insert(0) += 1;
        }

        let priority_range = match (
            self.rules.iter().map(|r| r.priority).min(),
            self.rules.iter().map(|r| r.priority).max(),
        ) {
            (Some(min), Some(max)) => Some(PriorityRange { min, max }),
            _ => None,
        };

        Statistics {
            name: self.name.clone(),
            selection: self.selection.name().to_string(),
            total_rules: self.rules.len(),
            total_intermediate_rules: self.intermediate_rules.len(),
            counts_by_category,
            counts_by_priority,
            priority_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::rule::Conclusion;
    use crate::Facts;

    fn rule_set() -> RuleSet {
        RuleSet::new("grading")
            .with_selection(SelectionPolicy::staged(["3", "2b"]))
            .add_rule(Rule::new(
                "03-01",
                300,
                vec![Condition::compare("hr_no_fever", Operator::GreaterThan, 170)],
                Conclusion::new("3", "Tachycardia above 170"),
            ))
            .add_rule(Rule::new(
                "2b-08",
                250,
                vec![Condition::compare("tachycardia_for_age", Operator::Equal, true)],
                Conclusion::new("2b", "Tachycardia for age"),
            ))
            .add_rule(Rule::new(
                "2b-01",
                250,
                vec![Condition::compare("startle_count", Operator::GreaterThanOrEqual, 2)],
                Conclusion::new("2b", "Startles"),
            ))
            .add_intermediate_rule(IntermediateRule::new(
                "INT-01",
                500,
                vec![Condition::compare("hr_no_fever", Operator::GreaterThan, 150)],
                Facts::new().with("tachycardia_for_age", true),
            ))
    }

    #[test]
    fn test_lookups() {
        let rules = rule_set();
        assert_eq!(rules.rule("2b-01").map(|r| r.priority), Some(250));
        assert!(rules.rule("INT-01").is_none());
        assert!(rules.intermediate_rule("INT-01").is_some());
        let ids: Vec<&str> = rules.rules_in_category("2b").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2b-08", "2b-01"]);
        assert!(!rules.is_simple());
    }

    #[test]
    fn test_statistics() {
        let stats = rule_set().statistics();
        assert_eq!(stats.total_rules, 3);
        assert_eq!(stats.total_intermediate_rules, 1);
        assert_eq!(stats.counts_by_category.get("2b"), Some(&2));
        assert_eq!(stats.counts_by_priority.get(&250), Some(&2));
        assert_eq!(stats.priority_range, Some(PriorityRange { min: 250, max: 300 }));
        assert_eq!(stats.selection, "staged");
    }

    #[test]
    fn test_fields() {
        let rules = rule_set();
        assert_eq!(
            rules.referenced_fields(),
            vec!["hr_no_fever", "startle_count", "tachycardia_for_age"]
        );
        assert_eq!(rules.input_fields(), vec!["hr_no_fever", "startle_count"]);
    }

    #[test]
    fn test_empty_statistics_have_no_range() {
        let stats = RuleSet::new("empty").statistics();
        assert_eq!(stats.total_rules, 0);
        assert!(stats.priority_range.is_none());
    }
}
