use anyhow::{Context, Result};
use inquire::{Select, Text};
use std::collections::BTreeMap;
use triage::{Engine, Facts, Operator, RuleSet, Value};

/// What kind of literal a field is compared against across the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Boolean,
    Number,
    Other,
}

/// Ask for every input field of the rule set that is not in `known`.
/// Returns only the newly answered facts; skipped fields stay missing.
pub fn prompt_missing_facts(engine: &Engine, known: &Facts) -> Result<Facts> {
    let kinds = field_kinds(engine.rule_set());
    let mut answers = Facts::new();

    for field in engine.rule_set().input_fields() {
        if known.contains(&field) {
            continue;
        }
        let kind = kinds.get(&field).copied().unwrap_or(FieldKind::Other);
        if let Some(value) = prompt_field(&field, kind)? {
            answers.insert(&field, value);
        }
    }

    Ok(answers)
}

fn prompt_field(field: &str, kind: FieldKind) -> Result<Option<Value>> {
    if kind == FieldKind::Boolean {
        let choice = Select::new(&format!("{}:", field), vec!["skip", "true", "false"])
            .with_help_message("Use arrow keys to navigate, Enter to select")
            .prompt()
            .with_context(|| format!("Failed to get value for {}", field))?;
        return Ok(match choice {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        });
    }

    let help = match kind {
        FieldKind::Number => "Number, or leave empty to skip",
        _ => "Text, number, true/false or [a, b]; leave empty to skip",
    };

    loop {
        let input = Text::new(&format!("{}:", field))
            .with_help_message(help)
            .prompt()
            .with_context(|| format!("Failed to get value for {}", field))?;

        if input.trim().is_empty() {
            return Ok(None);
        }
        match triage::parse_value(&input) {
            Ok(value) if kind == FieldKind::Number && value.as_number().is_none() => {
                eprintln!("{} expects a number", field);
            }
            Ok(value) => return Ok(Some(value)),
            Err(reason) => eprintln!("Invalid value for {}: {}", field, reason),
        }
    }
}

fn field_kinds(rule_set: &RuleSet) -> BTreeMap<String, FieldKind> {
    let mut kinds: BTreeMap<String, FieldKind> = BTreeMap::new();
    let mut visit = |field: &str, _: &Operator, value: &Value| {
        let kind = match value {
            Value::Boolean(_) => FieldKind::Boolean,
            Value::Number(_) => FieldKind::Number,
            _ => FieldKind::Other,
        };
        kinds
            .entry(field.to_string())
            .and_modify(|existing| {
                if *existing != kind {
                    *existing = FieldKind::Other;
                }
            })
            .or_insert(kind);
    };

    let conditions = rule_set
        .rules()
        .iter()
        .flat_map(|rule| rule.conditions.iter())
        .chain(
            rule_set
                .intermediate_rules()
                .iter()
                .flat_map(|rule| rule.conditions.iter()),
        );
    for condition in conditions {
        condition.for_each_comparison(&mut visit);
    }

    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage::builtin;

    #[test]
    fn test_field_kinds_of_grading_rules() {
        let engine = builtin::grading().unwrap();
        let kinds = field_kinds(engine.rule_set());

        assert_eq!(kinds.get("spo2"), Some(&FieldKind::Number));
        assert_eq!(kinds.get("somnolent"), Some(&FieldKind::Boolean));
        assert_eq!(kinds.get("age_months"), Some(&FieldKind::Number));
    }

    #[test]
    fn test_nothing_to_prompt_when_all_inputs_known() {
        let engine = builtin::diagnosis().unwrap();
        let known: Facts = engine
            .rule_set()
            .input_fields()
            .into_iter()
            .map(|field| (field, false))
            .collect();

        let answers = prompt_missing_facts(&engine, &known).unwrap();
        assert!(answers.is_empty());
    }
}
