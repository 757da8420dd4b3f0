use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::ids;
use crate::spec::question::Question;
use crate::spec::rule::Rule;

/// Failure to load a survey definition. Terminal for the session; there is
/// no partial or retried load.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse survey definition: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON schema of the survey definition format itself, for definition
/// authoring tools.
pub fn definition_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(SurveySpec)).unwrap_or_default()
}

/// Ordered view of one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionView {
    pub title: String,
    pub question_ids: Vec<String>,
}

/// Top-level survey definition as served by the definition source.
///
/// `questions_map` is keyed by string-encoded question id. `trigger_map`
/// lists, per trigger question, the targets whose state depends on it.
/// `logic_map` holds the ordered rule list per target question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions_map: BTreeMap<String, Question>,
    #[serde(default, deserialize_with = "ids::id_list_map")]
    pub trigger_map: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub logic_map: BTreeMap<String, Vec<Rule>>,
}

impl SurveySpec {
    /// Parses a definition as served by the definition source.
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions_map.get(id)
    }

    /// Ordered rule list for a target question, if any rules exist.
    pub fn rules_for(&self, target_id: &str) -> Option<&[Rule]> {
        self.logic_map.get(target_id).map(Vec::as_slice)
    }

    /// Targets to re-evaluate when the given question's answer changes.
    pub fn targets_of(&self, trigger_id: &str) -> &[String] {
        self.trigger_map
            .get(trigger_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Groups questions into wizard steps: ascending `order`, sections in
    /// order of first appearance.
    pub fn sections(&self) -> Vec<SectionView> {
        let mut questions: Vec<&Question> = self.questions_map.values().collect();
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let mut sections: Vec<SectionView> = Vec::new();
        for question in questions {
            match sections
                .iter_mut()
                .find(|section| section.title == question.section)
            {
                Some(section) => section.question_ids.push(question.id.clone()),
                None => sections.push(SectionView {
                    title: question.section.clone(),
                    question_ids: vec![question.id.clone()],
                }),
            }
        }
        sections
    }
}
