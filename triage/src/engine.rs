use crate::evaluator::Evaluator;
use crate::loader::parse_rule_set;
use crate::validator::{Source, Validator};
use crate::{Facts, ResourceLimits, Response, RuleSet, Statistics, TriageResult};
use std::sync::Arc;
use tracing::{info, warn};

/// The triage evaluation engine.
///
/// Holds one validated, immutable rule set. Cloning is cheap and every clone
/// shares the same rule set; each `evaluate` call works on its own memory, so
/// an engine can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct Engine {
    rule_set: Arc<RuleSet>,
    limits: ResourceLimits,
}

impl Engine {
    /// Validate a rule set built in code and wrap it in an engine
    pub fn new(rule_set: RuleSet) -> TriageResult<Self> {
        Self::with_limits(rule_set, ResourceLimits::default())
    }

    /// Create an engine with custom resource limits
    pub fn with_limits(rule_set: RuleSet, limits: ResourceLimits) -> TriageResult<Self> {
        let source = Source::detached(rule_set.name());
        Self::build(rule_set, &source, limits)
    }

    /// Load a rule set from a JSON rule definition document
    pub fn from_json(text: &str, source_id: &str) -> TriageResult<Self> {
        Self::from_json_with_limits(text, source_id, ResourceLimits::default())
    }

    pub fn from_json_with_limits(
        text: &str,
        source_id: &str,
        limits: ResourceLimits,
    ) -> TriageResult<Self> {
        let (rule_set, source) = parse_rule_set(text, source_id, &limits)?;
        Self::build(rule_set, &source, limits)
    }

    fn build(mut rule_set: RuleSet, source: &Source, limits: ResourceLimits) -> TriageResult<Self> {
        let warnings = Validator::new().validate(&rule_set, &limits, source)?;
        for warning in &warnings {
            warn!(rule_set = rule_set.name(), "{}", warning);
        }
        rule_set.set_warnings(warnings);

        info!(
            rule_set = rule_set.name(),
            selection = rule_set.selection().name(),
            rules = rule_set.rules().len(),
            intermediate_rules = rule_set.intermediate_rules().len(),
            "rule set loaded"
        );

        Ok(Self {
            rule_set: Arc::new(rule_set),
            limits,
        })
    }

    /// Evaluate facts against the rule set
    ///
    /// Never fails: missing or odd facts simply make conditions false, and a
    /// run without a conclusion reports the `undetermined` category.
    pub fn evaluate(&self, facts: &Facts) -> Response {
        Evaluator::new().evaluate(&self.rule_set, facts, &self.limits)
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Get the current resource limits
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn statistics(&self) -> Statistics {
        self.rule_set.statistics()
    }

    /// Non-fatal problems found while loading
    pub fn warnings(&self) -> &[String] {
        self.rule_set.warnings()
    }
}
