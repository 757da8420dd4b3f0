//! String-in/string-out facade over the survey logic engine.
//!
//! Hosts talk to the engine with JSON strings only: a config payload
//! carrying the survey definition, an answers payload, and scalar ids.
//! Every function returns a JSON string; failures become an
//! `{"error": ...}` object rather than a panic or a host-visible error
//! type. A definition that fails to load is terminal for the session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use survey_spec::{
    AnswerMap, DisplayState, SpecError, SurveySession, SurveySpec, answers_schema,
    build_render_payload, compute_display_state, render_json_ui, validate,
};

const DEFAULT_SPEC: &str = include_str!("../../survey-spec/tests/fixtures/vehicle_survey.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to load survey definition: {0}")]
    SpecLoad(#[from] SpecError),
    #[error("survey '{0}' is not available")]
    SurveyUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    survey_spec_json: Option<String>,
}

fn load_survey_spec(config_json: &str) -> Result<SurveySpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let spec_json = config.survey_spec_json.as_deref().unwrap_or(DEFAULT_SPEC);
    Ok(SurveySpec::from_json(spec_json)?)
}

fn ensure_survey(survey_id: &str, config_json: &str) -> Result<SurveySpec, ComponentError> {
    let spec = load_survey_spec(config_json)?;
    let known = spec.id.map(|id| id.to_string());
    if known.as_deref() == Some(survey_id) {
        Ok(spec)
    } else {
        Err(ComponentError::SurveyUnavailable(survey_id.to_string()))
    }
}

fn parse_answers(answers_json: &str) -> AnswerMap {
    serde_json::from_str(answers_json).unwrap_or_else(|_| Map::new())
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({ "error": format!("json encode: {}", error) }).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn display_state_json(state: &DisplayState) -> Value {
    let visibility = state
        .visibility
        .iter()
        .map(|(id, visible)| (id.clone(), Value::Bool(*visible)))
        .collect::<Map<_, _>>();

    let allowed = state
        .allowed_choices
        .iter()
        .map(|(id, allowed)| {
            let value = match allowed {
                Some(ids) => Value::Array(ids.iter().map(|id| json!(id)).collect()),
                None => Value::Null,
            };
            (id.clone(), value)
        })
        .collect::<Map<_, _>>();

    json!({
        "visibility": Value::Object(visibility),
        "allowed_choices": Value::Object(allowed),
    })
}

/// Echoes the parsed survey definition, or an error when the id does not
/// match the configured definition.
pub fn describe(survey_id: &str, config_json: &str) -> String {
    respond(
        ensure_survey(survey_id, config_json)
            .and_then(|spec| serde_json::to_value(spec).map_err(ComponentError::JsonEncode)),
    )
}

/// Computes the derived visibility and allowed-choice state for the given
/// answers. Pure: the answers payload is not modified.
pub fn display_state(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).map(|spec| {
        let answers = parse_answers(answers_json);
        let state = compute_display_state(&spec, &answers);
        display_state_json(&state)
    }))
}

/// Full render payload for the given answers, as consumed by UI layers.
pub fn render(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).map(|spec| {
        let answers = parse_answers(answers_json);
        render_json_ui(&build_render_payload(&spec, &answers))
    }))
}

/// JSON schema for the answers object under the current display state.
pub fn get_answers_schema(survey_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).map(|spec| {
        let answers = parse_answers(answers_json);
        let state = compute_display_state(&spec, &answers);
        answers_schema(&spec, &state)
    }))
}

/// Applies one answer change and runs trigger propagation. The response
/// carries the updated answers (with any disallowed selections cleared),
/// the refreshed display state, and the change summary.
pub fn submit_answer(
    survey_id: &str,
    config_json: &str,
    answers_json: &str,
    question_id: &str,
    value_json: &str,
) -> String {
    respond(ensure_survey(survey_id, config_json).map(|spec| {
        let answers = parse_answers(answers_json);
        let mut session = SurveySession::with_answers(spec, answers);
        let value: Value = serde_json::from_str(value_json).unwrap_or(Value::Null);
        let summary = session.set_answer(question_id, value);

        let payload = build_render_payload(session.spec(), session.answers());
        json!({
            "status": payload.status.as_str(),
            "answers": Value::Object(session.answers().clone()),
            "evaluated": summary.evaluated,
            "cleared": summary.cleared,
            "state": display_state_json(session.state()),
        })
    }))
}

/// Lints the configured definition for referential problems.
pub fn validate_definition(survey_id: &str, config_json: &str) -> String {
    respond(ensure_survey(survey_id, config_json).and_then(|spec| {
        serde_json::to_value(validate(&spec)).map_err(ComponentError::JsonEncode)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> String {
        json!({ "survey_spec_json": DEFAULT_SPEC }).to_string()
    }

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("response is JSON")
    }

    #[test]
    fn describe_rejects_unknown_survey_ids() {
        let response = parse(&describe("999", &config()));
        assert!(response["error"].as_str().unwrap().contains("999"));

        let response = parse(&describe("7", &config()));
        assert_eq!(response["title"], "Vehicle Insurance Intake");
    }

    #[test]
    fn empty_config_falls_back_to_the_bundled_definition() {
        let response = parse(&display_state("7", "", "{}"));
        assert_eq!(response["visibility"]["1"], json!(true));
        assert_eq!(response["visibility"]["2"], json!(false));
    }

    #[test]
    fn broken_definition_is_a_terminal_error() {
        let config = json!({ "survey_spec_json": "{ not json" }).to_string();
        let response = parse(&display_state("7", &config, "{}"));
        assert!(response["error"].as_str().unwrap().contains("definition"));
    }

    #[test]
    fn malformed_answers_payload_degrades_to_empty_answers() {
        let response = parse(&display_state("7", &config(), "not-json"));
        assert_eq!(response["visibility"]["2"], json!(false));
    }

    #[test]
    fn submit_answer_propagates_and_reports_cleared_questions() {
        let answers = json!({ "1": "yes", "3": "premium" }).to_string();
        let response = parse(&submit_answer("7", &config(), &answers, "4", "\"15\""));

        assert_eq!(response["cleared"], json!(["3"]));
        assert!(response["answers"].get("3").is_none());
        assert_eq!(response["state"]["allowed_choices"]["3"], json!([20, 21]));
    }

    #[test]
    fn submit_answer_with_null_clears_the_trigger() {
        let answers = json!({ "1": "yes" }).to_string();
        let response = parse(&submit_answer("7", &config(), &answers, "1", "null"));

        assert!(response["answers"].get("1").is_none());
        assert_eq!(response["state"]["visibility"]["2"], json!(false));
    }

    #[test]
    fn validate_definition_reports_valid_for_the_fixture() {
        let response = parse(&validate_definition("7", &config()));
        assert_eq!(response["valid"], json!(true));
    }

    #[test]
    fn answers_schema_restricts_choices() {
        let answers = json!({ "1": "yes", "4": "15" }).to_string();
        let response = parse(&get_answers_schema("7", &config(), &answers));
        assert_eq!(
            response["properties"]["3"]["enum"],
            json!(["basic", "standard"])
        );
    }
}
