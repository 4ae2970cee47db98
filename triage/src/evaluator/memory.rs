//! Working memory for a single evaluation
//!
//! Created fresh for every call and consumed into a `Response` at the end,
//! so nothing derived during one run is visible to the next.

use crate::facts::Facts;
use crate::response::{Outcome, Response, TraceStep};
use crate::rule::{ConclusionRecord, IntermediateRecord};
use std::collections::BTreeSet;

pub struct WorkingMemory {
    /// Input facts plus everything derived so far
    pub facts: Facts,

    /// Only the facts asserted during this run
    pub derived_facts: Facts,

    /// Indices of intermediate rules that already fired
    pub fired_intermediate: BTreeSet<usize>,

    pub fired_intermediate_rules: Vec<IntermediateRecord>,
    pub matched_rules: Vec<ConclusionRecord>,
    pub chosen_rule: Option<ConclusionRecord>,
    pub iterations: usize,
    pub trace: Vec<TraceStep>,
}

impl WorkingMemory {
    pub fn new(input: &Facts) -> Self {
        Self {
            facts: input.clone(),
            derived_facts: Facts::new(),
            fired_intermediate: BTreeSet::new(),
            fired_intermediate_rules: Vec::new(),
            matched_rules: Vec::new(),
            chosen_rule: None,
            iterations: 0,
            trace: vec![TraceStep::FactsLoaded { count: input.len() }],
        }
    }

    pub fn record(&mut self, step: TraceStep) {
        self.trace.push(step);
    }

    /// Assert a fact produced during this run
    pub fn assert_fact(&mut self, name: &str, value: impl Into<crate::Value>) {
        let value = value.into();
        self.facts.insert(name, value.clone());
        self.derived_facts.insert(name, value);
    }

    pub fn into_response(
        self,
        rule_set: &str,
        input: &Facts,
        category: String,
        outcome: Outcome,
        message: String,
    ) -> Response {
        Response {
            rule_set: rule_set.to_string(),
            success: outcome.is_success(),
            category,
            outcome,
            chosen_rule: self.chosen_rule,
            matched_rules: self.matched_rules,
            fired_intermediate_rules: self.fired_intermediate_rules,
            derived_facts: self.derived_facts,
            input_facts: input.clone(),
            iterations: self.iterations,
            message,
            trace: self.trace,
        }
    }
}
