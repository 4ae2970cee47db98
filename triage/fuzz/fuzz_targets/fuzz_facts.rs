#![no_main]

use libfuzzer_sys::fuzz_target;
use triage::builtin;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let Ok(engine) = builtin::grading() else {
            return;
        };

        let args: Vec<&str> = s.split('\n').collect();
        if let Ok(facts) = triage::parse_facts(&args) {
            let _ = engine.evaluate(&facts);
        }
        if let Ok(facts) = serde_json::from_str(s) {
            let _ = engine.evaluate(&facts);
        }
    }
});
