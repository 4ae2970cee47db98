//! Rule evaluation
//!
//! Evaluates a rule set against facts by:
//! 1. Building fresh working memory from the input facts
//! 2. Either a single match-and-select pass (no intermediate rules) or
//!    bounded forward chaining
//! 3. Building the response with the explanation trace

pub mod chaining;
pub mod condition;
pub mod memory;
pub mod selection;

use crate::response::{Outcome, Response, UNDETERMINED};
use crate::{Facts, ResourceLimits, RuleSet};
use memory::WorkingMemory;
use tracing::debug;

/// Evaluates facts against a rule set
#[derive(Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, rule_set: &RuleSet, facts: &Facts, limits: &ResourceLimits) -> Response {
        let mut memory = WorkingMemory::new(facts);

        let outcome = if rule_set.is_simple() {
            single_pass(rule_set, &mut memory)
        } else {
            let max_iterations = rule_set.max_iterations().unwrap_or(limits.max_iterations);
            chaining::run(rule_set, &mut memory, max_iterations)
        };

        let (category, message) = describe(rule_set, &memory, outcome);
        debug!(rule_set = rule_set.name(), ?outcome, %category, "evaluation finished");
        memory.into_response(rule_set.name(), facts, category, outcome, message)
    }
}

fn single_pass(rule_set: &RuleSet, memory: &mut WorkingMemory) -> Outcome {
    memory.iterations = 1;
    let facts = &memory.facts;
    let mut steps = Vec::new();
    let selected = selection::select(rule_set, |rule| rule.matches(facts), &mut steps);
    memory.trace.extend(steps);

    match selected {
        Some(selected) => {
            memory.matched_rules = selected.matched.iter().map(|rule| rule.fire()).collect();
            memory.chosen_rule = Some(selected.chosen.fire());
            Outcome::Concluded
        }
        None => Outcome::NoMatch,
    }
}

fn describe(rule_set: &RuleSet, memory: &WorkingMemory, outcome: Outcome) -> (String, String) {
    match outcome {
        Outcome::Concluded => match &memory.chosen_rule {
            Some(rule) => (
                rule.category.clone(),
                format!("Category {} determined by rule {}", rule.category, rule.rule_id),
            ),
            None => (UNDETERMINED.to_string(), "No conclusion recorded".to_string()),
        },
        Outcome::GoalFactPresent => {
            let category = memory
                .facts
                .get(rule_set.goal_fact())
                .map(|value| value.to_string())
                .unwrap_or_else(|| UNDETERMINED.to_string());
            let message = format!(
                "Goal fact {} is already known: {}",
                rule_set.goal_fact(),
                category
            );
            (category, message)
        }
        Outcome::NoMatch => (
            UNDETERMINED.to_string(),
            "No rule matched the given facts".to_string(),
        ),
        Outcome::IterationLimit => (
            UNDETERMINED.to_string(),
            format!(
                "Stopped after {} iteration(s) without reaching a conclusion",
                memory.iterations
            ),
        ),
    }
}
