//! Built-in knowledge bases for hand, foot and mouth disease (HFMD)
//!
//! Two stages, two engines: `diagnosis` decides whether the patient has
//! HFMD at all (priority selection, with a fallback rule), `grading` assigns
//! the severity grade 1, 2a, 2b, 3 or 4 (staged selection with forward
//! chaining over derived clinical signs).

use crate::{Engine, TriageError, TriageResult};

/// Rule definition of the severity grading stage
pub const GRADING_SOURCE: &str = include_str!("../rules/hfmd_grading.json");

/// Rule definition of the presence diagnosis stage
pub const DIAGNOSIS_SOURCE: &str = include_str!("../rules/hfmd_diagnosis.json");

/// Names accepted by `by_name`
pub const NAMES: [&str; 2] = ["grading", "diagnosis"];

pub fn grading() -> TriageResult<Engine> {
    Engine::from_json(GRADING_SOURCE, "builtin:hfmd_grading.json")
}

pub fn diagnosis() -> TriageResult<Engine> {
    Engine::from_json(DIAGNOSIS_SOURCE, "builtin:hfmd_diagnosis.json")
}

/// Look up a built-in rule set by short name or full rule set name
pub fn by_name(name: &str) -> TriageResult<Engine> {
    match name.trim().to_ascii_lowercase().as_str() {
        "grading" | "hfmd-grading" => grading(),
        "diagnosis" | "hfmd-diagnosis" => diagnosis(),
        other => Err(TriageError::Engine(format!(
            "Unknown built-in rule set '{}'. Available: {}",
            other,
            NAMES.join(", ")
        ))),
    }
}

/// Raw JSON of a built-in rule set
pub fn source(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "grading" | "hfmd-grading" => Some(GRADING_SOURCE),
        "diagnosis" | "hfmd-diagnosis" => Some(DIAGNOSIS_SOURCE),
        _ => None,
    }
}
