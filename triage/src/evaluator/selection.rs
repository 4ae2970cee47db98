//! Conflict resolution between matching conclusion rules
//!
//! `is_candidate` decides whether a rule is in play. Under the staged policy
//! it is only called for rules of the categories actually visited, so less
//! severe categories are never evaluated once a more severe one matched.

use crate::response::TraceStep;
use crate::rule::Rule;
use crate::rule_set::{RuleSet, SelectionPolicy};
use tracing::trace;

/// The winning rule together with the rules it was chosen from
pub struct Selected<'a> {
    pub chosen: &'a Rule,
    pub matched: Vec<&'a Rule>,
}

pub fn select<'a>(
    rule_set: &'a RuleSet,
    is_candidate: impl FnMut(&Rule) -> bool,
    steps: &mut Vec<TraceStep>,
) -> Option<Selected<'a>> {
    let selected = match rule_set.selection() {
        SelectionPolicy::Priority => select_by_priority(rule_set, is_candidate, steps),
        SelectionPolicy::Staged { category_order } => {
            select_staged(rule_set, category_order, is_candidate, steps)
        }
    }?;

    steps.push(TraceStep::ConclusionSelected {
        rule_id: selected.chosen.id.clone(),
        category: selected.chosen.category().to_string(),
        priority: selected.chosen.priority,
        candidates: selected.matched.len(),
    });
    Some(selected)
}

fn select_by_priority<'a>(
    rule_set: &'a RuleSet,
    mut is_candidate: impl FnMut(&Rule) -> bool,
    steps: &mut Vec<TraceStep>,
) -> Option<Selected<'a>> {
    let matched: Vec<&Rule> = rule_set
        .rules()
        .iter()
        .filter(|&rule| is_candidate(rule))
        .collect();
    record_matches(&matched, steps);
    let chosen = highest_priority(&matched)?;
    Some(Selected { chosen, matched })
}

fn select_staged<'a>(
    rule_set: &'a RuleSet,
    category_order: &'a [String],
    mut is_candidate: impl FnMut(&Rule) -> bool,
    steps: &mut Vec<TraceStep>,
) -> Option<Selected<'a>> {
    for category in category_order {
        let matched: Vec<&Rule> = rule_set
            .rules_in_category(category)
            .filter(|&rule| is_candidate(rule))
            .collect();
        steps.push(TraceStep::CategoryChecked {
            category: category.clone(),
            matched: matched.iter().map(|r| r.id.clone()).collect(),
        });
        if let Some(chosen) = highest_priority(&matched) {
            record_matches(&matched, steps);
            return Some(Selected { chosen, matched });
        }
    }
    None
}

fn record_matches(matched: &[&Rule], steps: &mut Vec<TraceStep>) {
    for rule in matched {
        trace!(rule = %rule.id, category = %rule.category(), "rule matched");
        steps.push(TraceStep::RuleMatched {
            rule_id: rule.id.clone(),
            category: rule.category().to_string(),
            priority: rule.priority,
        });
    }
}

/// Highest priority wins; on a tie the earlier rule is kept
pub fn highest_priority<'a>(rules: &[&'a Rule]) -> Option<&'a Rule> {
    rules.iter().copied().fold(None, |best, rule| match best {
        Some(best) if best.priority >= rule.priority => Some(best),
        _ => Some(rule),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::rule::Conclusion;
    use crate::Facts;

    fn rule(id: &str, category: &str, priority: i64, field: &str) -> Rule {
        Rule::new(
            id,
            priority,
            vec![Condition::compare(field, Operator::Equal, true)],
            Conclusion::new(category, id),
        )
    }

    #[test]
    fn test_tie_keeps_first_inserted() {
        let a = rule("a", "x", 5, "f");
        let b = rule("b", "x", 5, "f");
        let c = rule("c", "x", 3, "f");
        assert_eq!(highest_priority(&[&c, &a, &b]).map(|r| r.id.as_str()), Some("a"));
        assert!(highest_priority(&[]).is_none());
    }

    #[test]
    fn test_staged_skips_less_severe_categories() {
        let rules = RuleSet::new("staged")
            .with_selection(SelectionPolicy::staged(["4", "3", "1"]))
            .add_rule(rule("1-01", "1", 900, "mild"))
            .add_rule(rule("04-01", "4", 400, "severe"))
            .add_rule(rule("03-01", "3", 300, "moderate"));
        let facts = Facts::new()
            .with("mild", true)
            .with("severe", false)
            .with("moderate", true);

        let mut evaluated = Vec::new();
        let mut steps = Vec::new();
        let selected = select(
            &rules,
            |r| {
                evaluated.push(r.id.clone());
                r.matches(&facts)
            },
            &mut steps,
        )
        .map(|s| s.chosen.id.clone());

        assert_eq!(selected.as_deref(), Some("03-01"));
        assert_eq!(evaluated, vec!["04-01", "03-01"]);
        assert!(matches!(
            steps.first(),
            Some(TraceStep::CategoryChecked { category, matched }) if category == "4" && matched.is_empty()
        ));
    }
}
