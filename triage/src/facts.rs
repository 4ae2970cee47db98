//! Facts: named observations about the subject being evaluated
//!
//! A fact value is a boolean, a decimal number, a piece of text or a list of
//! values. Fact names are normalized (trimmed, lower-cased) so that `SpO2`
//! and `spo2` refer to the same observation.
//!
//! Serialization is hand-written: numbers stay JSON numbers and strings are
//! never reinterpreted as numbers on the way in.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single fact value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Number(Decimal),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Numeric view of the value used by relational operators.
    ///
    /// Numbers are returned as-is and text is parsed as a decimal after
    /// trimming. Booleans and lists have no numeric view.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()
            }
            Value::Boolean(_) | Value::List(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a human-readable name for the value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }

    /// Build a number from a float, rejecting NaN and infinities
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(Value::Number)
    }

    /// Render the value the way it would be written in a rule definition
    /// (text quoted, lists bracketed).
    pub fn literal(&self) -> String {
        match self {
            Value::Text(s) => format!("{:?}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::literal).collect();
                format!("[{}]", parts.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Decimal::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Decimal::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract().is_zero() {
                    if let Some(i) = n.to_i64() {
                        return serializer.serialize_i64(i);
                    }
                }
                match n.to_f64() {
                    Some(f) => serializer.serialize_f64(f),
                    None => serializer.serialize_str(&n.to_string()),
                }
            }
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean, number, string or list")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Value::from_f64(v).ok_or_else(|| E::custom(format!("number {} is out of range", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// A mapping of normalized fact names to values
///
/// Stored ordered by name so that iteration, serialization and therefore
/// evaluation results are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facts {
    values: BTreeMap<String, Value>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of a fact name
    pub fn normalize_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Insert a fact, returning the previous value under the same name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        self.values
            .insert(Self::normalize_key(name.as_ref()), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .or_else(|| self.values.get(&Self::normalize_key(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(&Self::normalize_key(name))
    }

    /// Copy every fact of `other` into `self`, overwriting on conflict
    pub fn merge(&mut self, other: &Facts) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Facts {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut facts = Facts::new();
        for (name, value) in iter {
            facts.insert(name, value);
        }
        facts
    }
}

impl<'a> IntoIterator for &'a Facts {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Serialize for Facts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct FactsVisitor;

impl<'de> Visitor<'de> for FactsVisitor {
    type Value = Facts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping fact names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Facts, A::Error> {
        let mut facts = Facts::new();
        // null means "not observed", which is the same as leaving the fact out
        while let Some((name, value)) = map.next_entry::<String, Option<Value>>()? {
            if let Some(value) = value {
                facts.insert(name, value);
            }
        }
        Ok(facts)
    }
}

impl<'de> Deserialize<'de> for Facts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FactsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_normalized() {
        let facts = Facts::new().with("  SpO2 ", 88);
        assert_eq!(facts.get("spo2"), Some(&Value::from(88)));
        assert_eq!(facts.get("SPO2"), Some(&Value::from(88)));
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_json_numbers_stay_numbers_and_strings_stay_text() {
        let facts: Facts = serde_json::from_str(r#"{"temp_c": 37.8, "code": "12"}"#).unwrap();
        assert_eq!(
            facts.get("temp_c"),
            Some(&Value::Number(Decimal::new(378, 1)))
        );
        assert_eq!(facts.get("code"), Some(&Value::Text("12".to_string())));
    }

    #[test]
    fn test_null_facts_are_dropped() {
        let facts: Facts = serde_json::from_str(r#"{"spo2": null, "coma": false}"#).unwrap();
        assert!(!facts.contains("spo2"));
        assert_eq!(facts.get("coma"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_serialize_keeps_json_types() {
        let facts = Facts::new()
            .with("age_months", 8)
            .with("temp_c", Value::Number(Decimal::new(395, 1)))
            .with("avpu_level", "P");
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"age_months": 8, "avpu_level": "P", "temp_c": 39.5})
        );
    }

    #[test]
    fn test_as_number_coercion() {
        assert_eq!(Value::from(" 39.5 ").as_number(), Some(Decimal::new(395, 1)));
        assert_eq!(Value::from("high").as_number(), None);
        assert_eq!(Value::from(true).as_number(), None);
    }

    #[test]
    fn test_display_normalizes_numbers() {
        assert_eq!(Value::Number(Decimal::new(8800, 2)).to_string(), "88");
        assert_eq!(
            Value::List(vec![Value::from("P"), Value::from("U")]).literal(),
            "[\"P\", \"U\"]"
        );
    }
}
