use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Live answers keyed by question id. Scalars for single-value questions, a
/// JSON array of choice values for multi-select. Absent key = no answer.
pub type AnswerMap = serde_json::Map<String, Value>;

/// Normalizes a stored answer into comparable text. Multi-select answers
/// collapse to a comma-joined string, matching how the persistence layer
/// flattens them. Null and structured values carry no comparable text.
pub fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(num) => Some(num.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>();
            Some(parts.join(","))
        }
    }
}

/// Whether a question counts as answered for progress purposes.
pub fn is_answered(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Transport metadata attached to a completed answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// A completed (or in-progress) set of answers for one survey, in the shape
/// accepted by the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerSet {
    pub survey_id: String,
    pub answers: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl AnswerSet {
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_text_joins_lists() {
        assert_eq!(
            answer_text(&json!(["red", "blue"])).as_deref(),
            Some("red,blue")
        );
        assert_eq!(answer_text(&json!("yes")).as_deref(), Some("yes"));
        assert_eq!(answer_text(&json!(12.5)).as_deref(), Some("12.5"));
        assert_eq!(answer_text(&Value::Null), None);
    }

    #[test]
    fn empty_values_do_not_count_as_answered() {
        assert!(!is_answered(None));
        assert!(!is_answered(Some(&json!(""))));
        assert!(!is_answered(Some(&json!([]))));
        assert!(is_answered(Some(&json!("x"))));
        assert!(is_answered(Some(&json!(0))));
    }

    #[test]
    fn answer_set_round_trips_through_cbor() {
        let set = AnswerSet {
            survey_id: "7".into(),
            answers: json!({ "1": "yes", "2": ["a", "b"] }),
            meta: Some(Meta {
                language: Some("en".into()),
                completed_at: None,
            }),
        };
        let bytes = set.to_cbor().expect("encode");
        let decoded = AnswerSet::from_cbor(&bytes).expect("decode");
        assert_eq!(decoded, set);
    }
}
