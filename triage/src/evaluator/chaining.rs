//! Bounded forward chaining
//!
//! Each iteration either fires one intermediate rule (growing working
//! memory) or selects a conclusion and stops. The loop ends early when the
//! goal fact is known or nothing is applicable any more.

use super::memory::WorkingMemory;
use super::selection::select;
use crate::response::{Outcome, TraceStep};
use crate::rule::IntermediateRule;
use crate::rule_set::RuleSet;
use tracing::{debug, trace};

pub fn run(rule_set: &RuleSet, memory: &mut WorkingMemory, max_iterations: usize) -> Outcome {
    let goal = rule_set.goal_fact();

    for iteration in 1..=max_iterations {
        memory.iterations = iteration;
        memory.record(TraceStep::IterationStarted { iteration });

        if let Some(value) = memory.facts.get(goal) {
            debug!(iteration, goal, %value, "goal fact already known");
            let value = value.clone();
            memory.record(TraceStep::GoalReached {
                fact: goal.to_string(),
                value,
            });
            return Outcome::GoalFactPresent;
        }

        let intermediate: Vec<(usize, &IntermediateRule)> = rule_set
            .intermediate_rules()
            .iter()
            .enumerate()
            .filter(|(index, rule)| {
                !memory.fired_intermediate.contains(index)
                    && rule.matches(&memory.facts)
                    && rule.derives_new_fact(&memory.facts)
            })
            .collect();

        let applicable: Vec<_> = rule_set
            .rules()
            .iter()
            .filter(|rule| rule.matches(&memory.facts))
            .collect();

        debug!(
            iteration,
            intermediate = intermediate.len(),
            conclusions = applicable.len(),
            "applicable rules"
        );

        if intermediate.is_empty() && applicable.is_empty() {
            memory.record(TraceStep::NoApplicableRules);
            return Outcome::NoMatch;
        }

        if let Some((index, rule)) = highest_intermediate(&intermediate) {
            trace!(rule = %rule.id, "firing intermediate rule");
            let record = rule.fire(&mut memory.facts);
            memory.derived_facts.merge(&rule.derived_facts);
            memory.fired_intermediate.insert(index);
            memory.record(TraceStep::IntermediateFired {
                rule_id: rule.id.clone(),
                priority: rule.priority,
                derived_facts: rule.derived_facts.clone(),
            });
            memory.fired_intermediate_rules.push(record);
            continue;
        }

        let mut steps = Vec::new();
        let selected = select(
            rule_set,
            |rule| applicable.iter().any(|candidate| std::ptr::eq(*candidate, rule)),
            &mut steps,
        );
        memory.trace.extend(steps);
        memory.matched_rules = applicable.iter().map(|rule| rule.fire()).collect();

        return match selected {
            Some(selected) => {
                let record = selected.chosen.fire();
                debug!(iteration, rule = %record.rule_id, category = %record.category, "conclusion reached");
                memory.assert_fact(goal, record.category.as_str());
                memory.record(TraceStep::GoalReached {
                    fact: goal.to_string(),
                    value: record.category.as_str().into(),
                });
                memory.chosen_rule = Some(record);
                Outcome::Concluded
            }
            None => {
                memory.record(TraceStep::NoApplicableRules);
                Outcome::NoMatch
            }
        };
    }

    debug!(max_iterations, "iteration limit reached");
    memory.record(TraceStep::IterationLimitReached {
        limit: max_iterations,
    });
    Outcome::IterationLimit
}

/// Highest priority first; on a tie the earlier rule is kept
fn highest_intermediate<'a>(
    candidates: &[(usize, &'a IntermediateRule)],
) -> Option<(usize, &'a IntermediateRule)> {
    candidates.iter().copied().fold(None, |best, candidate| match best {
        Some(best) if best.1.priority >= candidate.1.priority => Some(best),
        _ => Some(candidate),
    })
}
