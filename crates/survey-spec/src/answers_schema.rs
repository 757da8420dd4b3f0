use serde_json::{Map, Value, json};

use crate::logic::DisplayState;
use crate::spec::{Question, QuestionType, SurveySpec};

/// Builds a JSON schema for the answers object under the current display
/// state. Hidden questions are omitted entirely; choice questions constrain
/// values to the currently allowed choice set.
pub fn generate(spec: &SurveySpec, state: &DisplayState) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (id, question) in &spec.questions_map {
        if !state.is_visible(id) {
            continue;
        }
        properties.insert(id.clone(), question_schema(question, state));
        if question.required {
            required.push(Value::String(id.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
        "additionalProperties": false,
    })
}

fn question_schema(question: &Question, state: &DisplayState) -> Value {
    match question.kind {
        QuestionType::Text => json!({ "type": "string" }),
        QuestionType::Date => json!({ "type": "string", "format": "date" }),
        QuestionType::Number => json!({ "type": ["number", "string"] }),
        QuestionType::Radio | QuestionType::Dropdown => json!({
            "type": "string",
            "enum": allowed_values(question, state),
        }),
        QuestionType::Checkbox => json!({
            "type": "array",
            "items": {
                "type": "string",
                "enum": allowed_values(question, state),
            },
            "uniqueItems": true,
        }),
    }
}

fn allowed_values(question: &Question, state: &DisplayState) -> Vec<Value> {
    question
        .choices
        .iter()
        .filter(|choice| match state.allowed(&question.id) {
            Some(allowed) => allowed.contains(&choice.id),
            None => true,
        })
        .map(|choice| Value::String(choice.value.clone()))
        .collect()
}
