use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::answers::{AnswerMap, answer_text};
use crate::spec::{Operator, Question, Rule, RuleAction, SurveySpec};

pub type VisibilityMap = BTreeMap<String, bool>;

/// Derived state of one question after rule evaluation. `allowed_choices`
/// is `None` for an unrestricted choice set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionState {
    pub visible: bool,
    pub allowed_choices: Option<BTreeSet<u64>>,
}

impl Default for QuestionState {
    fn default() -> Self {
        QuestionState {
            visible: true,
            allowed_choices: None,
        }
    }
}

impl QuestionState {
    /// Whether a choice id is currently selectable under this state.
    pub fn allows_choice(&self, id: u64) -> bool {
        match &self.allowed_choices {
            Some(allowed) => allowed.contains(&id),
            None => true,
        }
    }
}

/// Full derived display state: what the rendering layer polls to decide
/// what to draw. It owns no logic itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub visibility: VisibilityMap,
    pub allowed_choices: BTreeMap<String, Option<BTreeSet<u64>>>,
}

impl DisplayState {
    /// Questions without an entry are implicitly visible.
    pub fn is_visible(&self, question_id: &str) -> bool {
        self.visibility.get(question_id).copied().unwrap_or(true)
    }

    pub fn allowed(&self, question_id: &str) -> Option<&BTreeSet<u64>> {
        self.allowed_choices
            .get(question_id)
            .and_then(Option::as_ref)
    }

    pub fn question_state(&self, question_id: &str) -> QuestionState {
        QuestionState {
            visible: self.is_visible(question_id),
            allowed_choices: self.allowed(question_id).cloned(),
        }
    }

    pub(crate) fn set(&mut self, question_id: &str, state: &QuestionState) {
        self.visibility
            .insert(question_id.to_string(), state.visible);
        self.allowed_choices
            .insert(question_id.to_string(), state.allowed_choices.clone());
    }
}

/// Condition predicate: does the trigger's current answer satisfy the rule?
///
/// An unanswered trigger never matches. Text operators compare lower-cased,
/// trimmed strings; numeric operators compare the leading numeric prefix of
/// both sides ("15 years" compares as 15) and resolve to `false` when no
/// prefix exists rather than erroring.
pub fn matches(answer: Option<&Value>, operator: Operator, rule_value: &str) -> bool {
    let Some(text) = answer.and_then(answer_text) else {
        return false;
    };
    let lhs = text.trim().to_lowercase();
    let rhs = rule_value.trim().to_lowercase();

    match operator {
        Operator::Eq => lhs == rhs,
        Operator::Neq => lhs != rhs,
        Operator::Contains => lhs.contains(&rhs),
        Operator::Gt => match (leading_number(&lhs), leading_number(&rhs)) {
            (Some(left), Some(right)) => left > right,
            _ => false,
        },
        Operator::Lt => match (leading_number(&lhs), leading_number(&rhs)) {
            (Some(left), Some(right)) => left < right,
            _ => false,
        },
        Operator::Unknown => false,
    }
}

/// Parses the longest numeric prefix of a string, so units and other
/// trailing text after the number are ignored. `None` when the string does
/// not start with a number. Expects lower-cased input.
fn leading_number(text: &str) -> Option<f64> {
    let mut end = text
        .char_indices()
        .take_while(|(_, ch)| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e'))
        .map(|(index, ch)| index + ch.len_utf8())
        .last()?;
    // The candidate may overrun the number ("1e" or "2.5.0"), so back off
    // until a parseable prefix remains.
    while end > 0 {
        if let Ok(value) = text[..end].parse::<f64>() {
            return Some(value);
        }
        end -= 1;
    }
    None
}

/// Evaluates one target question's rule list against the current answers.
///
/// Rules are processed in stored order. Show/hide matches OR-accumulate.
/// Choice actions mutate a single running allowed set: `limit_choices` and
/// `include_choices` union into a set that starts empty, `exclude_choices`
/// seeds the set with the question's full choice ids on first match and
/// removes from whatever is current afterwards. If any `show` rule exists
/// the target is shown iff a show rule matched and no hide rule matched;
/// otherwise the target is default-visible and hidden only on a hide match.
pub fn evaluate_question(question: &Question, rules: &[Rule], answers: &AnswerMap) -> QuestionState {
    let has_show_rules = rules.iter().any(|rule| rule.action == RuleAction::Show);
    let mut show_matched = false;
    let mut hide_matched = false;
    let mut allowed: Option<BTreeSet<u64>> = None;

    for rule in rules {
        let answer = answers.get(rule.trigger_question.as_str());
        if !matches(answer, rule.operator, &rule.value) {
            continue;
        }
        match rule.action {
            RuleAction::Show => show_matched = true,
            RuleAction::Hide => hide_matched = true,
            RuleAction::LimitChoices | RuleAction::IncludeChoices => {
                allowed
                    .get_or_insert_with(BTreeSet::new)
                    .extend(rule.target_choices.iter().copied());
            }
            RuleAction::ExcludeChoices => {
                let set = allowed.get_or_insert_with(|| question.choice_ids());
                for id in &rule.target_choices {
                    set.remove(id);
                }
            }
            RuleAction::Unknown => {}
        }
    }

    let visible = if has_show_rules {
        show_matched && !hide_matched
    } else {
        !hide_matched
    };

    // Choice restriction only applies to choice-based inputs.
    let allowed_choices = if question.kind.is_choice_based() {
        allowed
    } else {
        None
    };

    QuestionState {
        visible,
        allowed_choices,
    }
}

/// Re-evaluates a single target from scratch. Returns `None` when the target
/// id does not resolve to a question; stale rules never fail evaluation.
/// Idempotent for fixed answers, callable at any time after load.
pub fn evaluate(spec: &SurveySpec, answers: &AnswerMap, target_id: &str) -> Option<QuestionState> {
    let question = spec.question(target_id)?;
    let state = match spec.rules_for(target_id) {
        Some(rules) => evaluate_question(question, rules, answers),
        None => QuestionState::default(),
    };
    Some(state)
}

/// Pure snapshot of the whole survey's visibility and allowed-choice sets
/// for the given answers. Questions without rules are visible and
/// unrestricted.
pub fn compute_display_state(spec: &SurveySpec, answers: &AnswerMap) -> DisplayState {
    let mut state = DisplayState::default();
    for (id, question) in &spec.questions_map {
        let question_state = match spec.rules_for(id) {
            Some(rules) => evaluate_question(question, rules, answers),
            None => QuestionState::default(),
        };
        state.set(id, &question_state);
    }
    state
}
