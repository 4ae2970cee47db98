use crate::{builtin, clinical, Engine, Facts, TriageError};
use serde_json::json;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEngine {
    engine: Option<Engine>,
}

#[wasm_bindgen]
impl WasmEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();

        WasmEngine { engine: None }
    }

    #[wasm_bindgen(js_name = loadRules)]
    pub fn load_rules(&mut self, rules_json: &str, source: &str) -> String {
        self.install(Engine::from_json(rules_json, source))
    }

    #[wasm_bindgen(js_name = loadBuiltin)]
    pub fn load_builtin(&mut self, name: &str) -> String {
        self.install(builtin::by_name(name))
    }

    /// Evaluate a JSON object of facts; `deriveVitals` adds hr_no_fever and pulse_pressure
    #[wasm_bindgen(js_name = evaluate)]
    pub fn evaluate(&self, facts_json: &str, derive_vitals: bool) -> String {
        let Some(engine) = &self.engine else {
            return error_json("No rule set loaded");
        };

        let mut facts: Facts = if facts_json.trim().is_empty() {
            Facts::new()
        } else {
            match serde_json::from_str(facts_json) {
                Ok(facts) => facts,
                Err(e) => return error_json(&format!("Invalid facts JSON: {}", e)),
            }
        };
        if derive_vitals {
            clinical::augment_vitals(&mut facts);
        }

        let response = engine.evaluate(&facts);
        let explanation = response.explain(false);
        serde_json::to_string(&json!({
            "success": true,
            "response": response,
            "explanation": explanation,
            "error": null
        }))
        .unwrap_or_else(|_| error_json("Failed to serialize response"))
    }

    #[wasm_bindgen(js_name = statistics)]
    pub fn statistics(&self) -> String {
        match &self.engine {
            Some(engine) => serde_json::to_string(&json!({
                "success": true,
                "statistics": engine.statistics(),
                "error": null
            }))
            .unwrap_or_else(|_| error_json("Failed to serialize statistics")),
            None => error_json("No rule set loaded"),
        }
    }
}

impl WasmEngine {
    fn install(&mut self, engine: Result<Engine, TriageError>) -> String {
        match engine {
            Ok(engine) => {
                let body = json!({
                    "success": true,
                    "rule_set": engine.rule_set().name(),
                    "warnings": engine.warnings(),
                    "error": null
                });
                self.engine = Some(engine);
                body.to_string()
            }
            Err(e) => error_json(&format_error(&e)),
        }
    }
}

impl Default for WasmEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn error_json(message: &str) -> String {
    json!({ "success": false, "error": message }).to_string()
}

fn format_error(error: &TriageError) -> String {
    match error {
        TriageError::Parse(details) => format!("Parse Error: {}", details.message),
        TriageError::Validation(details) => format!("Validation Error: {}", details.message),
        TriageError::Engine(msg) => format!("Engine Error: {}", msg),
        TriageError::ResourceLimitExceeded { .. } => error.to_string(),
        TriageError::MultipleErrors(errors) => {
            let error_messages: Vec<String> = errors.iter().map(format_error).collect();
            format!("Multiple Errors:\n{}", error_messages.join("\n"))
        }
    }
}
