//! Derived vital signs
//!
//! Bedside measurements are entered raw; the grading rules are written
//! against a fever-adjusted heart rate and the pulse pressure.

use crate::facts::{Facts, Value};
use rust_decimal::Decimal;

/// Temperature above which each degree raises the heart rate by ten beats
const FEVER_THRESHOLD_C: i64 = 38;
const BEATS_PER_DEGREE: i64 = 10;

/// Heart rate with the fever contribution removed, truncated toward zero:
/// `hr - max(0, (temp - 38) * 10)`
pub fn hr_no_fever(heart_rate: Decimal, temp_c: Decimal) -> Decimal {
    let excess = temp_c - Decimal::from(FEVER_THRESHOLD_C);
    let adjustment = (excess * Decimal::from(BEATS_PER_DEGREE)).max(Decimal::ZERO);
    (heart_rate - adjustment).trunc()
}

/// Systolic minus diastolic pressure
pub fn pulse_pressure(sbp: Decimal, dbp: Decimal) -> Decimal {
    sbp - dbp
}

/// Add `hr_no_fever` and `pulse_pressure` when their inputs are present
/// and they are not already given. Returns the names of the facts added.
pub fn augment_vitals(facts: &mut Facts) -> Vec<&'static str> {
    let mut added = Vec::new();

    if !facts.contains("hr_no_fever") {
        if let (Some(hr), Some(temp)) = (number(facts, "heart_rate"), number(facts, "temp_c")) {
            facts.insert("hr_no_fever", Value::Number(hr_no_fever(hr, temp)));
            added.push("hr_no_fever");
        }
    }

    if !facts.contains("pulse_pressure") {
        if let (Some(sbp), Some(dbp)) = (number(facts, "sbp_mmhg"), number(facts, "dbp_mmhg")) {
            facts.insert("pulse_pressure", Value::Number(pulse_pressure(sbp, dbp)));
            added.push("pulse_pressure");
        }
    }

    added
}

fn number(facts: &Facts, name: &str) -> Option<Decimal> {
    facts.get(name).and_then(Value::as_number)
}
