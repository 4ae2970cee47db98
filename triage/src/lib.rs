//! # Triage Engine
//!
//! **Forward-chaining rule evaluation for clinical decision aids**
//!
//! Triage matches a bag of observed facts against declarative
//! condition → conclusion rules and selects a single conclusion, either by
//! priority or by walking severity categories from most to least severe.
//! Intermediate rules can derive new facts first, in a bounded
//! forward-chaining loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use triage::{Engine, Facts, TriageResult};
//!
//! fn main() -> TriageResult<()> {
//!     let engine = Engine::from_json(r#"{
//!         "name": "example",
//!         "conclusion_rules": [
//!             {"id": "low-oxygen", "priority": 10,
//!              "conditions": [{"field": "spo2", "operator": "<", "value": 92}],
//!              "conclusion": {"category": "urgent", "description": "SpO2 below 92%"}}
//!         ]
//!     }"#, "example.json")?;
//!
//!     let response = engine.evaluate(&Facts::new().with("spo2", 88));
//!     assert_eq!(response.category, "urgent");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Facts
//! Named values: booleans, decimal numbers, text or lists. Names are
//! case-insensitive. A condition on a fact that is missing is false.
//!
//! ### Rules
//! Conclusion rules produce a category. Intermediate rules assert new facts
//! that later rules can use. Rules AND their conditions together; groups
//! allow nested AND/OR.
//!
//! ### Selection
//! `priority` picks the highest priority match, the first authored on ties.
//! `staged` checks categories in a fixed severity order and stops at the
//! first category with a match.

pub mod builtin;
pub mod clinical;
pub mod condition;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod facts;
pub mod loader;
pub mod parser;
pub mod resource_limits;
pub mod response;
pub mod rule;
pub mod rule_set;
pub mod span;
pub mod validator;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use condition::{Condition, GroupKind, Operator};
pub use engine::Engine;
pub use error::{ErrorDetails, TriageError};
pub use facts::{Facts, Value};
pub use parser::{parse_facts, parse_value};
pub use resource_limits::ResourceLimits;
pub use response::{Outcome, Response, TraceStep, UNDETERMINED};
pub use rule::{Conclusion, ConclusionRecord, IntermediateRecord, IntermediateRule, Rule};
pub use rule_set::{PriorityRange, RuleSet, SelectionPolicy, Statistics, DEFAULT_GOAL_FACT};
pub use span::Span;
pub use validator::{Source, Validator};

/// Result type for triage operations
pub type TriageResult<T> = Result<T, TriageError>;
