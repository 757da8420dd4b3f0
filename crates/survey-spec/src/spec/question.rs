use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::ids;

/// A single selectable option of a choice-based question. Identity is `id`;
/// `value` is what gets stored as the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Choice {
    pub id: u64,
    pub value: String,
    pub label: String,
}

/// Input kind of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Number,
    Date,
    Radio,
    Dropdown,
    Checkbox,
}

impl QuestionType {
    /// Whether answers come from a fixed choice list.
    pub fn is_choice_based(&self) -> bool {
        matches!(
            self,
            QuestionType::Radio | QuestionType::Dropdown | QuestionType::Checkbox
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Date => "date",
            QuestionType::Radio => "radio",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Checkbox => "checkbox",
        }
    }
}

fn default_required() -> bool {
    true
}

/// A single survey question. Immutable after the definition is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    #[serde(deserialize_with = "ids::string_or_number")]
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub section: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Question {
    /// Ids of every configured choice.
    pub fn choice_ids(&self) -> BTreeSet<u64> {
        self.choices.iter().map(|choice| choice.id).collect()
    }

    /// Resolves a stored answer value back to its backing choice.
    pub fn choice_by_value(&self, value: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.value == value)
    }
}
