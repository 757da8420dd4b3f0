use serde_json::{Map, Value, json};

use crate::answers::{AnswerMap, is_answered};
use crate::logic::compute_display_state;
use crate::spec::{QuestionType, SurveySpec};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// At least one visible question is unanswered.
    NeedInput,
    /// All visible questions are filled.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Progress counters exposed to renderers. Only visible questions are
/// counted, so both numbers move as visibility changes.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// One choice as the renderer should draw it.
#[derive(Debug, Clone)]
pub struct RenderChoice {
    pub id: u64,
    pub value: String,
    pub label: String,
    pub selectable: bool,
}

/// Describes a single question for render outputs.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub text: String,
    pub kind: QuestionType,
    pub section: String,
    pub required: bool,
    pub visible: bool,
    pub current_value: Option<Value>,
    pub choices: Vec<RenderChoice>,
}

/// One wizard step.
#[derive(Debug, Clone)]
pub struct RenderSection {
    pub title: String,
    pub question_ids: Vec<String>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_title: String,
    pub description: String,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub sections: Vec<RenderSection>,
    pub questions: Vec<RenderQuestion>,
}

impl RenderPayload {
    pub fn question(&self, id: &str) -> Option<&RenderQuestion> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn visible_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.visible)
            .count()
    }
}

/// Snapshots the survey for the rendering layer: a pure function of the
/// definition and the current answers.
pub fn build_render_payload(spec: &SurveySpec, answers: &AnswerMap) -> RenderPayload {
    let state = compute_display_state(spec, answers);

    let sections = spec
        .sections()
        .into_iter()
        .map(|section| RenderSection {
            title: section.title,
            question_ids: section.question_ids,
        })
        .collect::<Vec<_>>();

    let mut questions = Vec::new();
    for section in &sections {
        for id in &section.question_ids {
            let Some(question) = spec.question(id) else {
                continue;
            };
            let question_state = state.question_state(id);
            let choices = question
                .choices
                .iter()
                .map(|choice| RenderChoice {
                    id: choice.id,
                    value: choice.value.clone(),
                    label: choice.label.clone(),
                    selectable: question_state.allows_choice(choice.id),
                })
                .collect();
            questions.push(RenderQuestion {
                id: question.id.clone(),
                text: question.text.clone(),
                kind: question.kind,
                section: question.section.clone(),
                required: question.required,
                visible: question_state.visible,
                current_value: answers.get(id).cloned(),
                choices,
            });
        }
    }

    let total = questions.iter().filter(|question| question.visible).count();
    let answered = questions
        .iter()
        .filter(|question| question.visible && is_answered(question.current_value.as_ref()))
        .count();

    let status = if answered == total {
        RenderStatus::Complete
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        survey_title: spec.title.clone(),
        description: spec.description.clone(),
        status,
        progress: RenderProgress { answered, total },
        sections,
        questions,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let questions = payload
        .questions
        .iter()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("text".into(), Value::String(question.text.clone()));
            map.insert(
                "type".into(),
                Value::String(question.kind.as_str().to_string()),
            );
            map.insert("section".into(), Value::String(question.section.clone()));
            map.insert("required".into(), Value::Bool(question.required));
            map.insert("visible".into(), Value::Bool(question.visible));
            if let Some(current_value) = &question.current_value {
                map.insert("current_value".into(), current_value.clone());
            }
            if !question.choices.is_empty() {
                map.insert(
                    "choices".into(),
                    Value::Array(
                        question
                            .choices
                            .iter()
                            .map(|choice| {
                                json!({
                                    "id": choice.id,
                                    "value": choice.value,
                                    "label": choice.label,
                                    "selectable": choice.selectable,
                                })
                            })
                            .collect(),
                    ),
                );
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let sections = payload
        .sections
        .iter()
        .map(|section| {
            json!({
                "title": section.title,
                "question_ids": section.question_ids,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "survey_title": payload.survey_title,
        "description": payload.description,
        "status": payload.status.as_str(),
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "sections": sections,
        "questions": questions,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Survey: {}", payload.survey_title));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));
    if !payload.description.is_empty() {
        lines.push(format!("About: {}", payload.description));
    }

    for section in &payload.sections {
        let visible = section
            .question_ids
            .iter()
            .filter_map(|id| payload.question(id))
            .filter(|question| question.visible)
            .collect::<Vec<_>>();
        if visible.is_empty() {
            continue;
        }
        lines.push(format!("Section: {}", section.title));
        for question in visible {
            let mut entry = format!(" - {} ({})", question.text, question.id);
            if question.required {
                entry.push_str(" [required]");
            }
            if let Some(current_value) = &question.current_value {
                entry.push_str(&format!(" = {}", value_to_display(current_value)));
            }
            lines.push(entry);
            let selectable = question
                .choices
                .iter()
                .filter(|choice| choice.selectable)
                .map(|choice| choice.label.as_str())
                .collect::<Vec<_>>();
            if !selectable.is_empty() {
                lines.push(format!("   Choices: {}", selectable.join(", ")));
            }
        }
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
