use triage::{Engine, TriageError};

/// Load-time errors: malformed documents, invalid rule sets and their locations

// ============================================================================
// PARSE ERRORS
// ============================================================================

#[test]
fn test_malformed_json_reports_line_and_column() {
    let result = Engine::from_json(
        "{\n  \"name\": \"broken\",\n  \"conclusion_rules\": [}\n}",
        "broken.json",
    );

    match result {
        Err(TriageError::Parse(details)) => {
            assert_eq!(details.source_id, "broken.json");
            let span = details.span.expect("parse errors carry a span");
            assert_eq!(span.line, 3);
            assert!(span.col > 1);
        }
        Err(e) => panic!("Expected Parse error, got: {:?}", e),
        Ok(_) => panic!("Expected error for malformed JSON"),
    }
}

#[test]
fn test_missing_required_field() {
    let result = Engine::from_json(
        r#"{"conclusion_rules": [{"id": "r1", "conditions": []}]}"#,
        "missing.json",
    );

    match result {
        Err(TriageError::Parse(details)) => {
            assert!(details.message.contains("conclusion"), "{}", details.message);
        }
        Err(e) => panic!("Expected Parse error, got: {:?}", e),
        Ok(_) => panic!("Expected error for missing conclusion"),
    }
}

#[test]
fn test_unknown_selection_mode() {
    let result = Engine::from_json(
        r#"{"selection": {"mode": "recency"},
            "conclusion_rules": [{"id": "r1", "conclusion": {"category": "x"}}]}"#,
        "mode.json",
    );
    assert!(matches!(result, Err(TriageError::Parse(_))));
}

#[test]
fn test_misspelled_conditions_key_is_rejected() {
    let result = Engine::from_json(
        r#"{"conclusion_rules": [
            {"id": "severe", "priority": 400,
             "condition": [{"field": "spo2", "operator": "<", "value": 92}],
             "conclusion": {"category": "4"}}
        ]}"#,
        "typo.json",
    );

    match result {
        Err(TriageError::Parse(details)) => {
            assert!(
                details.message.contains("unknown field `condition`"),
                "{}",
                details.message
            );
            assert!(details.span.is_some());
        }
        Err(e) => panic!("Expected Parse error, got: {:?}", e),
        Ok(_) => panic!("A rule with a misspelled conditions key must not load"),
    }
}

#[test]
fn test_misspelled_intermediate_rules_key_is_rejected() {
    let result = Engine::from_json(
        r#"{"conclusion_rules": [
            {"id": "r1", "conditions": [{"field": "tachycardia", "operator": "==", "value": true}],
             "conclusion": {"category": "2b"}}
          ],
          "intermediate_rule": [
            {"id": "i1", "conditions": [{"field": "hr", "operator": ">", "value": 150}],
             "derived_facts": {"tachycardia": true}}
          ]}"#,
        "typo.json",
    );

    match result {
        Err(TriageError::Parse(details)) => {
            assert!(
                details.message.contains("unknown field `intermediate_rule`"),
                "{}",
                details.message
            );
        }
        Err(e) => panic!("Expected Parse error, got: {:?}", e),
        Ok(_) => panic!("A misspelled intermediate_rules key must not load"),
    }
}

#[test]
fn test_unknown_intermediate_rule_key_is_rejected() {
    let result = Engine::from_json(
        r#"{"conclusion_rules": [{"id": "r1", "conclusion": {"category": "a"}}],
            "intermediate_rules": [
              {"id": "i1", "conditions": [], "derived_fact": {"x": true}}
            ]}"#,
        "typo.json",
    );
    assert!(matches!(result, Err(TriageError::Parse(_))));
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[test]
fn test_duplicate_rule_id_points_at_rule() {
    let source = r#"{
  "conclusion_rules": [
    {"id": "r1", "conclusion": {"category": "a"}},
    {"id": "r1", "conclusion": {"category": "b"}}
  ]
}"#;

    match Engine::from_json(source, "dup.json") {
        Err(TriageError::Validation(details)) => {
            assert_eq!(details.message, "Duplicate rule id 'r1'");
            let span = details.span.expect("validation errors locate the rule id");
            assert_eq!(span.line, 3);
            assert_eq!(&source[span.start..span.end], "\"r1\"");
        }
        Err(e) => panic!("Expected Validation error, got: {:?}", e),
        Ok(_) => panic!("Expected error for duplicate rule id"),
    }
}

#[test]
fn test_category_missing_from_staged_order() {
    let source = r#"{
  "selection": {"mode": "staged", "category_order": ["4", "3"]},
  "conclusion_rules": [
    {"id": "r1", "conclusion": {"category": "4"}},
    {"id": "r2", "conclusion": {"degree": "2a"}}
  ]
}"#;

    match Engine::from_json(source, "staged.json") {
        Err(TriageError::Validation(details)) => {
            assert!(details.message.contains("'2a'"));
            assert_eq!(details.suggestion.as_deref(), Some("Use one of: 4, 3"));
        }
        Err(e) => panic!("Expected Validation error, got: {:?}", e),
        Ok(_) => panic!("Expected error for category outside the order"),
    }
}

#[test]
fn test_multiple_problems_are_reported_together() {
    let source = r#"{
  "selection": {"mode": "staged", "category_order": []},
  "conclusion_rules": [],
  "intermediate_rules": [{"id": "i1", "derived_facts": {}}]
}"#;

    match Engine::from_json(source, "many.json") {
        Err(TriageError::MultipleErrors(errors)) => {
            assert_eq!(errors.len(), 3);
            let text = TriageError::MultipleErrors(errors).to_string();
            assert!(text.starts_with("Multiple errors:"));
            assert!(text.contains("no conclusion rules"));
            assert!(text.contains("non-empty category_order"));
            assert!(text.contains("derives no facts"));
        }
        Err(e) => panic!("Expected MultipleErrors, got: {:?}", e),
        Ok(_) => panic!("Expected errors"),
    }
}

#[test]
fn test_error_display_includes_location() {
    let err = Engine::from_json("{\"conclusion_rules\": 5}", "shape.json").unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("Parse error: "), "{}", text);
    assert!(text.contains(" at shape.json:1:"), "{}", text);
}

// ============================================================================
// WARNINGS
// ============================================================================

#[test]
fn test_unknown_operator_loads_with_warning() {
    let engine = Engine::from_json(
        r#"{"conclusion_rules": [
            {"id": "r1", "conditions": [{"field": "x", "operator": "~=", "value": 1}],
             "conclusion": {"category": "a"}},
            {"id": "r2", "conditions": [{"type": "XOR", "conditions": []}],
             "conclusion": {"category": "b"}}
        ]}"#,
        "warn.json",
    )
    .unwrap();

    assert_eq!(engine.warnings().len(), 2);
    let response = engine.evaluate(&triage::Facts::new().with("x", 1));
    assert!(!response.success);
}
