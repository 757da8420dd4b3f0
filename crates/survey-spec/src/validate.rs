use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::{Question, Rule, SurveySpec};

/// Single authoring problem found in a survey definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Result of linting a definition. The evaluator itself stays tolerant of
/// every problem reported here; this is authoring-time tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Checks the referential invariants of a definition: logic and trigger maps
/// may only name questions that exist, rule triggers must be real questions,
/// and choice actions must name choices the target actually has.
pub fn validate(spec: &SurveySpec) -> ValidationReport {
    let mut errors = Vec::new();

    for (id, question) in &spec.questions_map {
        if question.kind.is_choice_based() && question.choices.is_empty() {
            errors.push(error(id, "choice-based question has no choices", "no_choices"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for choice in &question.choices {
            if !seen.insert(choice.id) {
                errors.push(error(id, "duplicate choice id", "duplicate_choice"));
            }
        }
    }

    for (target_id, rules) in &spec.logic_map {
        let target = spec.question(target_id);
        if target.is_none() {
            errors.push(error(
                target_id,
                "logic target references unknown question",
                "unknown_target",
            ));
        }
        for rule in rules {
            check_rule(spec, target_id, target, rule, &mut errors);
        }
    }

    for (trigger_id, targets) in &spec.trigger_map {
        if spec.question(trigger_id).is_none() {
            errors.push(error(
                trigger_id,
                "trigger map key references unknown question",
                "unknown_trigger",
            ));
        }
        for target_id in targets {
            if spec.question(target_id).is_none() {
                errors.push(error(
                    target_id,
                    "trigger map target references unknown question",
                    "unknown_target",
                ));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn check_rule(
    spec: &SurveySpec,
    target_id: &str,
    target: Option<&Question>,
    rule: &Rule,
    errors: &mut Vec<ValidationError>,
) {
    if spec.question(&rule.trigger_question).is_none() {
        errors.push(error(
            target_id,
            "rule trigger references unknown question",
            "unknown_rule_trigger",
        ));
    }

    if !rule.action.is_choice_action() {
        return;
    }

    if rule.target_choices.is_empty() {
        errors.push(error(
            target_id,
            "choice action without target choices",
            "empty_target_choices",
        ));
    }

    let Some(target) = target else {
        return;
    };
    if !target.kind.is_choice_based() {
        errors.push(error(
            target_id,
            "choice action on a non-choice question",
            "choice_action_type",
        ));
        return;
    }
    let known = target.choice_ids();
    for choice_id in &rule.target_choices {
        if !known.contains(choice_id) {
            errors.push(error(
                target_id,
                "rule names a choice the target question does not have",
                "unknown_choice",
            ));
        }
    }
}

fn error(question_id: &str, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: Some(question_id.to_string()),
        message: message.into(),
        code: Some(code.into()),
    }
}
