//! Rule definition documents
//!
//! Rule sets are written as JSON. Parsing here only checks the shape of the
//! document; unknown keys are rejected. Structural rules (unique ids, staged
//! category order, ...) are enforced by the validator afterwards.

use crate::condition::{Condition, GroupKind, Operator};
use crate::facts::{Facts, Value};
use crate::rule::{Conclusion, IntermediateRule, Rule};
use crate::validator::Source;
use crate::{ResourceLimits, RuleSet, SelectionPolicy, Span, TriageError, TriageResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetDef {
    name: Option<String>,
    #[serde(default)]
    selection: SelectionDef,
    goal_fact: Option<String>,
    max_iterations: Option<usize>,
    #[serde(default, alias = "rules")]
    conclusion_rules: Vec<RuleDef>,
    #[serde(default)]
    intermediate_rules: Vec<IntermediateRuleDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum SelectionDef {
    #[default]
    Priority,
    Staged {
        category_order: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    id: String,
    name: Option<String>,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    conditions: Vec<ConditionDef>,
    conclusion: ConclusionDef,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConclusionDef {
    #[serde(alias = "disease_level", alias = "degree")]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(flatten)]
    attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntermediateRuleDef {
    id: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    conditions: Vec<ConditionDef>,
    #[serde(default)]
    derived_facts: Facts,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConditionDef {
    Group {
        #[serde(rename = "type")]
        kind: String,
        conditions: Vec<ConditionDef>,
    },
    Compare {
        field: String,
        #[serde(alias = "op")]
        operator: String,
        value: Value,
    },
}

impl From<ConditionDef> for Condition {
    fn from(def: ConditionDef) -> Self {
        match def {
            ConditionDef::Group { kind, conditions } => Condition::Group {
                kind: GroupKind::from_name(&kind),
                conditions: conditions.into_iter().map(Condition::from).collect(),
            },
            ConditionDef::Compare {
                field,
                operator,
                value,
            } => Condition::compare(field, Operator::from_symbol(&operator), value),
        }
    }
}

fn conditions(defs: Vec<ConditionDef>) -> Vec<Condition> {
    defs.into_iter().map(Condition::from).collect()
}

/// Parse a rule definition document into an (unvalidated) rule set
///
/// The rule set name defaults to the file stem of `source_id`.
pub fn parse_rule_set(
    text: &str,
    source_id: &str,
    limits: &ResourceLimits,
) -> TriageResult<(RuleSet, Source)> {
    if text.len() > limits.max_file_size_bytes {
        return Err(TriageError::ResourceLimitExceeded {
            limit_name: "max_file_size_bytes".to_string(),
            limit_value: limits.max_file_size_bytes.to_string(),
            actual_value: text.len().to_string(),
            suggestion: format!(
                "Reduce the rule file size to {} bytes or less",
                limits.max_file_size_bytes
            ),
        });
    }

    let source = Source::new(source_id, Arc::<str>::from(text));
    let def: RuleSetDef = serde_json::from_str(text).map_err(|e| {
        let span = (e.line() > 0).then(|| Span::from_line_col(text, e.line(), e.column()));
        TriageError::parse(
            json_message(&e),
            span,
            source_id.to_string(),
            source.text.clone(),
        )
    })?;

    let name = def.name.unwrap_or_else(|| {
        Path::new(source_id)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(source_id)
            .to_string()
    });

    let selection = match def.selection {
        SelectionDef::Priority => SelectionPolicy::Priority,
        SelectionDef::Staged { category_order } => SelectionPolicy::Staged { category_order },
    };

    let mut rule_set = RuleSet::new(name).with_selection(selection);
    if let Some(goal_fact) = def.goal_fact {
        rule_set = rule_set.with_goal_fact(goal_fact);
    }
    if let Some(max_iterations) = def.max_iterations {
        rule_set = rule_set.with_max_iterations(max_iterations);
    }

    for rule in def.conclusion_rules {
        let conclusion = Conclusion {
            category: rule.conclusion.category,
            description: rule.conclusion.description,
            attributes: rule.conclusion.attributes,
        };
        let mut built = Rule::new(rule.id, rule.priority, conditions(rule.conditions), conclusion);
        built.name = rule.name;
        built.source = rule.source;
        rule_set = rule_set.add_rule(built);
    }

    for rule in def.intermediate_rules {
        rule_set = rule_set.add_intermediate_rule(
            IntermediateRule::new(
                rule.id,
                rule.priority,
                conditions(rule.conditions),
                rule.derived_facts,
            )
            .with_description(rule.description),
        );
    }

    Ok((rule_set, source))
}

/// serde_json appends " at line L column C"; the span carries that instead
fn json_message(error: &serde_json::Error) -> String {
    let message = error.to_string();
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TriageResult<RuleSet> {
        parse_rule_set(text, "rules/test.json", &ResourceLimits::default()).map(|(rs, _)| rs)
    }

    #[test]
    fn test_parse_full_document() {
        let rules = parse(
            r#"{
                "name": "grading",
                "selection": {"mode": "staged", "category_order": ["4", "2b"]},
                "max_iterations": 5,
                "conclusion_rules": [
                    {"id": "04-01", "priority": 400,
                     "conditions": [
                        {"field": "SpO2", "operator": "<", "value": 92},
                        {"type": "OR", "conditions": [
                            {"field": "coma", "operator": "==", "value": true},
                            {"field": "avpu_level", "operator": "in", "value": ["P", "U"]}
                        ]}
                     ],
                     "conclusion": {"degree": "4", "description": "Severe", "urgency": "high"},
                     "source": "Decision 292/2015 II.6"}
                ],
                "intermediate_rules": [
                    {"id": "INT-01", "priority": 500,
                     "conditions": [{"field": "hr_no_fever", "operator": ">", "value": 150}],
                     "derived_facts": {"tachycardia_for_age": true},
                     "description": "Tachycardia for age"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(rules.name(), "grading");
        assert_eq!(rules.max_iterations(), Some(5));
        assert_eq!(rules.goal_fact(), "final_category");
        let rule = rules.rule("04-01").unwrap();
        assert_eq!(rule.category(), "4");
        assert_eq!(
            rule.conclusion.attributes.get("urgency"),
            Some(&serde_json::json!("high"))
        );
        assert_eq!(
            rule.conditions[1].to_string(),
            "(coma == true OR avpu_level in [\"P\", \"U\"])"
        );
        assert_eq!(rules.intermediate_rules().len(), 1);
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let rules = parse(r#"{"conclusion_rules": []}"#).unwrap();
        assert_eq!(rules.name(), "test");
        assert_eq!(rules.selection(), &SelectionPolicy::Priority);
    }

    #[test]
    fn test_invalid_json_is_located() {
        let err = parse("{\n  \"conclusion_rules\": [,]\n}").unwrap_err();
        match err {
            TriageError::Parse(details) => {
                let span = details.span.expect("span");
                assert_eq!(span.line, 2);
                assert!(!details.message.contains(" at line "));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_size_limit() {
        let limits = ResourceLimits {
            max_file_size_bytes: 10,
            ..ResourceLimits::default()
        };
        let result = parse_rule_set(r#"{"conclusion_rules": []}"#, "big.json", &limits);
        assert!(matches!(
            result,
            Err(TriageError::ResourceLimitExceeded { .. })
        ));
    }
}
