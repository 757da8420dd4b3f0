use std::collections::BTreeSet;

use serde_json::Value;

use crate::answers::AnswerMap;
use crate::logic::{DisplayState, QuestionState, compute_display_state, evaluate};
use crate::spec::{Question, SurveySpec};

/// Outcome of one answer change: which targets were re-evaluated and which
/// questions had a now-disallowed selection cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub evaluated: Vec<String>,
    pub cleared: Vec<String>,
}

/// Owns the live answers and the derived display state for one respondent.
///
/// All mutation is synchronous and single-threaded: an answer change runs
/// the whole propagation pass, including answer clearing, before control
/// returns. Propagation is deliberately non-transitive: clearing a selection
/// on a target does not re-enter the pipeline for that target's own
/// dependents. They stay as-is until the next explicit answer change.
#[derive(Debug, Clone)]
pub struct SurveySession {
    spec: SurveySpec,
    answers: AnswerMap,
    state: DisplayState,
}

impl SurveySession {
    /// Builds a session and runs the baseline pass: every question with
    /// rules is evaluated against the (possibly empty) starting answers.
    pub fn new(spec: SurveySpec) -> Self {
        Self::with_answers(spec, AnswerMap::new())
    }

    /// Resumes a session from previously persisted answers. Selections that
    /// the restored state no longer allows are cleared up front.
    pub fn with_answers(spec: SurveySpec, answers: AnswerMap) -> Self {
        let mut session = SurveySession {
            state: compute_display_state(&spec, &answers),
            spec,
            answers,
        };
        let targets: Vec<String> = session.spec.logic_map.keys().cloned().collect();
        for target in &targets {
            session.refresh_target(target);
        }
        session
    }

    pub fn spec(&self) -> &SurveySpec {
        &self.spec
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn answer(&self, question_id: &str) -> Option<&Value> {
        self.answers.get(question_id)
    }

    /// Stores an answer and re-evaluates every dependent target, in trigger
    /// list order. Storing `Value::Null` clears the answer, which must leave
    /// dependents exactly as if the trigger had never been answered.
    pub fn set_answer(&mut self, question_id: &str, value: Value) -> ChangeSummary {
        if value.is_null() {
            self.answers.remove(question_id);
        } else {
            self.answers.insert(question_id.to_string(), value);
        }
        self.propagate(question_id)
    }

    /// Removes an answer and re-evaluates dependents.
    pub fn clear_answer(&mut self, question_id: &str) -> ChangeSummary {
        self.answers.remove(question_id);
        self.propagate(question_id)
    }

    fn propagate(&mut self, trigger_id: &str) -> ChangeSummary {
        let targets = self.spec.targets_of(trigger_id).to_vec();
        let mut summary = ChangeSummary::default();
        for target in targets {
            if let Some(cleared) = self.refresh_target(&target) {
                summary.evaluated.push(target.clone());
                if cleared {
                    summary.cleared.push(target);
                }
            }
        }
        summary
    }

    /// Recomputes one target and clears any selection the new allowed set
    /// rejects, atomically with publishing the new state. Unknown targets
    /// are a silent no-op.
    fn refresh_target(&mut self, target_id: &str) -> Option<bool> {
        let state = evaluate(&self.spec, &self.answers, target_id)?;
        let question = self.spec.question(target_id)?;
        let cleared = match &state.allowed_choices {
            Some(allowed) => enforce_allowed(question, allowed, &mut self.answers),
            None => false,
        };
        self.state.set(target_id, &state);
        Some(cleared)
    }

    /// State for a single question; defaults apply when no rules exist.
    pub fn question_state(&self, question_id: &str) -> QuestionState {
        self.state.question_state(question_id)
    }
}

/// Drops answer values whose backing choice id is no longer allowed.
/// Values that do not resolve to any configured choice are left alone.
/// Returns whether anything was removed.
fn enforce_allowed(question: &Question, allowed: &BTreeSet<u64>, answers: &mut AnswerMap) -> bool {
    let Some(current) = answers.get(&question.id) else {
        return false;
    };

    match current {
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .filter(|item| {
                    let Some(text) = item.as_str() else {
                        return true;
                    };
                    match question.choice_by_value(text) {
                        Some(choice) => allowed.contains(&choice.id),
                        None => true,
                    }
                })
                .cloned()
                .collect();
            if kept.len() == items.len() {
                return false;
            }
            if kept.is_empty() {
                answers.remove(&question.id);
            } else {
                answers.insert(question.id.clone(), Value::Array(kept));
            }
            true
        }
        Value::String(text) => {
            let disallowed = question
                .choice_by_value(text)
                .is_some_and(|choice| !allowed.contains(&choice.id));
            if disallowed {
                answers.remove(&question.id);
            }
            disallowed
        }
        _ => false,
    }
}
