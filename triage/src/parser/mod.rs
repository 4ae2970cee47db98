//! Fact parsing from `name=value` strings
//!
//! Used by the CLI and anything else taking facts from a command line.
//! Values are `true`/`false`, decimal numbers, quoted or bare text, or a
//! bracketed comma-separated list of those.

use crate::facts::{Facts, Value};
use crate::{TriageError, TriageResult};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse `name=value` strings into a fact mapping; later duplicates win
pub fn parse_facts(fact_strings: &[&str]) -> TriageResult<Facts> {
    let mut facts = Facts::new();

    for fact_str in fact_strings {
        let (name, value) = fact_str.split_once('=').ok_or_else(|| {
            TriageError::Engine(format!(
                "Failed to parse fact '{}': expected name=value",
                fact_str
            ))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(TriageError::Engine(format!(
                "Failed to parse fact '{}': missing fact name",
                fact_str
            )));
        }

        let value = parse_value(value).map_err(|reason| {
            TriageError::Engine(format!("Failed to parse fact '{}': {}", fact_str, reason))
        })?;
        facts.insert(name, value);
    }

    Ok(facts)
}

/// Parse a single literal value
pub fn parse_value(input: &str) -> Result<Value, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("missing value".to_string());
    }

    if let Some(inner) = input.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| "unterminated list".to_string())?;
        if inner.trim().is_empty() {
            return Ok(Value::List(Vec::new()));
        }
        let items = inner
            .split(',')
            .map(parse_scalar)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(items));
    }

    parse_scalar(input)
}

fn parse_scalar(input: &str) -> Result<Value, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty list item".to_string());
    }
    if let Some(text) = unquote(input) {
        return Ok(Value::Text(text.to_string()));
    }
    match input {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        _ => {}
    }
    if let Ok(number) = Decimal::from_str(input) {
        return Ok(Value::Number(number));
    }
    Ok(Value::Text(input.to_string()))
}

fn unquote(input: &str) -> Option<&str> {
    ['"', '\''].iter().find_map(|&quote| {
        input
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_values() {
        let facts = parse_facts(&[
            "spo2=88",
            "temp_c = 39.5",
            "coma=false",
            "avpu_level=P",
            "code=\"12\"",
            "symptoms=[fever, 'rash', 3]",
        ])
        .unwrap();

        assert_eq!(facts.get("spo2"), Some(&Value::from(88)));
        assert_eq!(facts.get("temp_c"), Some(&Value::Number(Decimal::new(395, 1))));
        assert_eq!(facts.get("coma"), Some(&Value::Boolean(false)));
        assert_eq!(facts.get("avpu_level"), Some(&Value::from("P")));
        assert_eq!(facts.get("code"), Some(&Value::from("12")));
        assert_eq!(
            facts.get("symptoms"),
            Some(&Value::List(vec![
                Value::from("fever"),
                Value::from("rash"),
                Value::from(3)
            ]))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_facts(&["spo2"]).is_err());
        assert!(parse_facts(&["=88"]).is_err());
        assert!(parse_facts(&["spo2="]).is_err());
        assert!(parse_facts(&["levels=[a, b"]).is_err());
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(parse_value("[]"), Ok(Value::List(vec![])));
    }
}
