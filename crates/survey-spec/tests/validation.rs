use serde_json::json;

use survey_spec::{SurveySpec, validate};

fn fixture() -> SurveySpec {
    SurveySpec::from_json(include_str!("fixtures/vehicle_survey.json")).expect("fixture parses")
}

fn codes(report: &survey_spec::ValidationReport) -> Vec<&str> {
    report
        .errors
        .iter()
        .filter_map(|error| error.code.as_deref())
        .collect()
}

#[test]
fn fixture_definition_is_valid() {
    let report = validate(&fixture());
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
}

#[test]
fn unknown_references_are_reported() {
    let spec: SurveySpec = serde_json::from_value(json!({
        "title": "Broken",
        "questions_map": {
            "1": { "id": 1, "text": "Q1", "type": "text", "section": "S" }
        },
        "trigger_map": { "99": ["1"], "1": ["42"] },
        "logic_map": {
            "7": [
                { "trigger_question": "88", "operator": "eq", "value": "x", "action": "show" }
            ]
        }
    }))
    .expect("spec parses");

    let report = validate(&spec);
    assert!(!report.valid);
    let codes = codes(&report);
    assert!(codes.contains(&"unknown_target"));
    assert!(codes.contains(&"unknown_trigger"));
    assert!(codes.contains(&"unknown_rule_trigger"));
}

#[test]
fn choice_rules_are_checked_against_target_choices() {
    let spec: SurveySpec = serde_json::from_value(json!({
        "title": "Choices",
        "questions_map": {
            "1": { "id": 1, "text": "Gate", "type": "text", "section": "S" },
            "2": {
                "id": 2, "text": "Pick", "type": "radio", "section": "S",
                "choices": [
                    { "id": 1, "value": "a", "label": "A" }
                ]
            },
            "3": { "id": 3, "text": "Free", "type": "text", "section": "S" }
        },
        "logic_map": {
            "2": [
                {
                    "trigger_question": "1", "operator": "eq", "value": "x",
                    "action": "limit_choices", "target_choices": [1, 999]
                },
                {
                    "trigger_question": "1", "operator": "eq", "value": "x",
                    "action": "exclude_choices"
                }
            ],
            "3": [
                {
                    "trigger_question": "1", "operator": "eq", "value": "x",
                    "action": "limit_choices", "target_choices": [1]
                }
            ]
        }
    }))
    .expect("spec parses");

    let report = validate(&spec);
    assert!(!report.valid);
    let codes = codes(&report);
    assert!(codes.contains(&"unknown_choice"));
    assert!(codes.contains(&"empty_target_choices"));
    assert!(codes.contains(&"choice_action_type"));
}

#[test]
fn choice_questions_must_define_choices() {
    let spec: SurveySpec = serde_json::from_value(json!({
        "title": "Empty",
        "questions_map": {
            "1": { "id": 1, "text": "Pick", "type": "dropdown", "section": "S" }
        }
    }))
    .expect("spec parses");

    let report = validate(&spec);
    assert!(codes(&report).contains(&"no_choices"));
}
