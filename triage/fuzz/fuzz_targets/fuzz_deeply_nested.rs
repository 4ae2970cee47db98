#![no_main]

use libfuzzer_sys::fuzz_target;
use triage::{Engine, Facts};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let depth = (data[0] as usize % 64) + 1;
    let mut condition = r#"{"field": "x", "operator": "<", "value": 10}"#.to_string();
    for level in 0..depth {
        let kind = if data.get(level + 1).copied().unwrap_or(0) % 2 == 0 {
            "AND"
        } else {
            "OR"
        };
        condition = format!(r#"{{"type": "{}", "conditions": [{}]}}"#, kind, condition);
    }
    let rules = format!(
        r#"{{"conclusion_rules": [{{"id": "deep", "conditions": [{}], "conclusion": {{"category": "a"}}}}]}}"#,
        condition
    );

    if let Ok(engine) = Engine::from_json(&rules, "fuzz_nested") {
        let _ = engine.evaluate(&Facts::new().with("x", 3));
    }
});
