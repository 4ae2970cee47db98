#![no_main]

use libfuzzer_sys::fuzz_target;
use triage::{Engine, Facts};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(engine) = Engine::from_json(s, "fuzz_input") {
            let _ = engine.evaluate(&Facts::new());
        }
    }
});
