use crate::facts::{Facts, Value};
use crate::rule::{ConclusionRecord, IntermediateRecord};
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

/// Category reported when no rule could be selected
pub const UNDETERMINED: &str = "undetermined";

/// How an evaluation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A conclusion rule was selected
    Concluded,
    /// The goal fact was already present, so no conclusion rule was needed
    GoalFactPresent,
    /// No rule was applicable
    NoMatch,
    /// Forward chaining ran out of iterations before concluding
    IterationLimit,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Concluded | Outcome::GoalFactPresent)
    }
}

/// Response from evaluating facts against a rule set
///
/// Contains the selected category, the rule that produced it, everything
/// that matched or fired along the way and an ordered explanation trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub rule_set: String,
    pub success: bool,
    pub category: String,
    pub outcome: Outcome,
    pub chosen_rule: Option<ConclusionRecord>,
    pub matched_rules: Vec<ConclusionRecord>,
    pub fired_intermediate_rules: Vec<IntermediateRecord>,
    pub derived_facts: Facts,
    pub input_facts: Facts,
    pub iterations: usize,
    pub message: String,
    pub trace: Vec<TraceStep>,
}

/// One step of the explanation trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceStep {
    FactsLoaded {
        count: usize,
    },
    IterationStarted {
        iteration: usize,
    },
    /// A severity category was checked; `matched` is empty when nothing in it matched
    CategoryChecked {
        category: String,
        matched: Vec<String>,
    },
    RuleMatched {
        rule_id: String,
        category: String,
        priority: i64,
    },
    IntermediateFired {
        rule_id: String,
        priority: i64,
        derived_facts: Facts,
    },
    ConclusionSelected {
        rule_id: String,
        category: String,
        priority: i64,
        candidates: usize,
    },
    GoalReached {
        fact: String,
        value: Value,
    },
    NoApplicableRules,
    IterationLimitReached {
        limit: usize,
    },
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStep::FactsLoaded { count } => write!(f, "Loaded {} input facts", count),
            TraceStep::IterationStarted { iteration } => write!(f, "Iteration {}", iteration),
            TraceStep::CategoryChecked { category, matched } => {
                if matched.is_empty() {
                    write!(f, "Category {}: no match", category)
                } else {
                    write!(f, "Category {}: matched {}", category, matched.join(", "))
                }
            }
            TraceStep::RuleMatched {
                rule_id,
                category,
                priority,
            } => write!(
                f,
                "Rule {} matched (category {}, priority {})",
                rule_id, category, priority
            ),
            TraceStep::IntermediateFired {
                rule_id,
                derived_facts,
                ..
            } => {
                let facts: Vec<String> = derived_facts
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect();
                write!(f, "Intermediate rule {} asserted {}", rule_id, facts.join(", "))
            }
            TraceStep::ConclusionSelected {
                rule_id,
                category,
                priority,
                candidates,
            } => write!(
                f,
                "Selected rule {} (category {}, priority {}) out of {} candidate(s)",
                rule_id, category, priority, candidates
            ),
            TraceStep::GoalReached { fact, value } => {
                write!(f, "Goal {} = {}", fact, value)
            }
            TraceStep::NoApplicableRules => write!(f, "No applicable rules remain"),
            TraceStep::IterationLimitReached { limit } => {
                write!(f, "Iteration limit of {} reached", limit)
            }
        }
    }
}

impl Response {
    /// Human-readable explanation; `verbose` appends the full trace
    pub fn explain(&self, verbose: bool) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_explanation(&mut out, verbose);
        out
    }

    fn write_explanation(&self, out: &mut String, verbose: bool) -> fmt::Result {
        writeln!(out, "Result: {}", self.category)?;
        writeln!(out, "{}", self.message)?;

        if let Some(rule) = &self.chosen_rule {
            writeln!(out)?;
            writeln!(out, "Rule {} (priority {})", rule.rule_id, rule.priority)?;
            if !rule.description.is_empty() {
                writeln!(out, "  {}", rule.description)?;
            }
            for condition in &rule.conditions {
                writeln!(out, "  - {}", condition)?;
            }
            if let Some(source) = &rule.source {
                writeln!(out, "  Source: {}", source)?;
            }
        }

        if !self.fired_intermediate_rules.is_empty() {
            writeln!(out)?;
            writeln!(out, "Derived along the way:")?;
            for record in &self.fired_intermediate_rules {
                let facts: Vec<String> = record
                    .derived_facts
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect();
                write!(out, "  {} => {}", record.rule_id, facts.join(", "))?;
                if !record.description.is_empty() {
                    write!(out, " ({})", record.description)?;
                }
                writeln!(out)?;
            }
        }

        let others: Vec<&ConclusionRecord> = self
            .matched_rules
            .iter()
            .filter(|r| {
                self.chosen_rule
                    .as_ref()
                    .map_or(true, |chosen| chosen.rule_id != r.rule_id)
            })
            .collect();
        if !others.is_empty() {
            writeln!(out)?;
            writeln!(out, "Also matched:")?;
            for rule in others {
                writeln!(
                    out,
                    "  {} (category {}, priority {})",
                    rule.rule_id, rule.category, rule.priority
                )?;
            }
        }

        if verbose {
            writeln!(out)?;
            writeln!(out, "Trace ({} iteration(s)):", self.iterations)?;
            for (i, step) in self.trace.iter().enumerate() {
                writeln!(out, "  {:>2}. {}", i + 1, step)?;
            }
        }
        Ok(())
    }
}
