use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::ids;

/// Comparison operator of a rule condition.
///
/// Definitions may be edited concurrently by survey authors, so an operator
/// this build does not know about must not fail the whole survey load. It
/// deserializes to [`Operator::Unknown`], which never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Lt,
    Contains,
    Unknown,
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "gt" => Operator::Gt,
            "lt" => Operator::Lt,
            "contains" => Operator::Contains,
            _ => Operator::Unknown,
        }
    }
}

/// Effect applied to the target question when the condition matches.
/// Unrecognized wire values become [`RuleAction::Unknown`], a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RuleAction {
    Show,
    Hide,
    LimitChoices,
    IncludeChoices,
    ExcludeChoices,
    Unknown,
}

impl From<String> for RuleAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "show" => RuleAction::Show,
            "hide" => RuleAction::Hide,
            "limit_choices" => RuleAction::LimitChoices,
            "include_choices" => RuleAction::IncludeChoices,
            "exclude_choices" => RuleAction::ExcludeChoices,
            _ => RuleAction::Unknown,
        }
    }
}

impl RuleAction {
    /// Whether this action edits the allowed-choice set of the target.
    pub fn is_choice_action(&self) -> bool {
        matches!(
            self,
            RuleAction::LimitChoices | RuleAction::IncludeChoices | RuleAction::ExcludeChoices
        )
    }
}

/// Declarative condition-action pair. Rules are keyed by target question in
/// [`crate::SurveySpec::logic_map`]; list order is significant because choice
/// actions compose onto one running set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    #[serde(deserialize_with = "ids::string_or_number")]
    pub trigger_question: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "ids::scalar_text")]
    pub value: String,
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_choices: Vec<u64>,
}
