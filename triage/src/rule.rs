//! Conclusion rules and intermediate (fact-deriving) rules
//!
//! Both kinds AND-combine their conditions; an empty condition list matches
//! unconditionally. Firing a conclusion rule only produces a record. Firing an
//! intermediate rule also asserts its derived facts into working memory.

use crate::condition::Condition;
use crate::facts::Facts;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The final answer a conclusion rule produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub category: String,
    pub description: String,
    /// Any further attributes carried through from the rule definition
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Conclusion {
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// A rule whose firing produces a final categorical answer
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: Option<String>,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub conclusion: Conclusion,
    pub source: Option<String>,
}

/// Immutable snapshot of a fired (or matched) conclusion rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConclusionRecord {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub category: String,
    pub priority: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub conditions: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        priority: i64,
        conditions: Vec<Condition>,
        conclusion: Conclusion,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            priority,
            conditions,
            conclusion,
            source: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn category(&self) -> &str {
        &self.conclusion.category
    }

    /// AND of all conditions; a rule without conditions always matches
    pub fn matches(&self, facts: &Facts) -> bool {
        self.conditions.iter().all(|c| c.evaluate(facts))
    }

    /// Snapshot this rule as a conclusion record. Does not touch any facts.
    pub fn fire(&self) -> ConclusionRecord {
        ConclusionRecord {
            rule_id: self.id.clone(),
            name: self.name.clone(),
            category: self.conclusion.category.clone(),
            priority: self.priority,
            description: self.conclusion.description.clone(),
            source: self.source.clone(),
            conditions: self.conditions.iter().map(|c| c.to_string()).collect(),
            attributes: self.conclusion.attributes.clone(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule {} (P:{}): IF ", self.id, self.priority)?;
        write_conditions(f, &self.conditions)?;
        write!(f, " THEN category {}", self.conclusion.category)
    }
}

/// A rule whose firing asserts new facts instead of concluding
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateRule {
    pub id: String,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub derived_facts: Facts,
    pub description: String,
}

/// What an intermediate rule asserted when it fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateRecord {
    pub rule_id: String,
    pub priority: i64,
    pub description: String,
    pub derived_facts: Facts,
    pub conditions: Vec<String>,
}

impl IntermediateRule {
    pub fn new(
        id: impl Into<String>,
        priority: i64,
        conditions: Vec<Condition>,
        derived_facts: Facts,
    ) -> Self {
        Self {
            id: id.into(),
            priority,
            conditions,
            derived_facts,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn matches(&self, facts: &Facts) -> bool {
        self.conditions.iter().all(|c| c.evaluate(facts))
    }

    /// True when firing would assert at least one fact not already present
    pub fn derives_new_fact(&self, facts: &Facts) -> bool {
        self.derived_facts.names().any(|name| !facts.contains(name))
    }

    /// Merge the derived facts into `working_facts` and describe what was asserted
    pub fn fire(&self, working_facts: &mut Facts) -> IntermediateRecord {
        working_facts.merge(&self.derived_facts);
        IntermediateRecord {
            rule_id: self.id.clone(),
            priority: self.priority,
            description: self.description.clone(),
            derived_facts: self.derived_facts.clone(),
            conditions: self.conditions.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl fmt::Display for IntermediateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntermediateRule {} (P:{}): IF ", self.id, self.priority)?;
        write_conditions(f, &self.conditions)?;
        write!(f, " THEN ASSERT ")?;
        let facts: Vec<String> = self
            .derived_facts
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        write!(f, "{}", facts.join(", "))
    }
}

fn write_conditions(f: &mut fmt::Formatter<'_>, conditions: &[Condition]) -> fmt::Result {
    if conditions.is_empty() {
        return write!(f, "always");
    }
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, " AND ")?;
        }
        write!(f, "{}", condition)?;
    }
    Ok(())
}
