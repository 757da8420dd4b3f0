mod presenter;

use clap::{Parser, Subcommand, ValueEnum};
use component_survey::{display_state as component_display_state, render as component_render};
use presenter::{AnswerParseError, QuestionPrompt, SurveyPresenter, Verbosity};
use serde_json::{Value, json};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use survey_spec::{
    AnswerMap, AnswerSet, Question, QuestionState, QuestionType, SurveySession, SurveySpec,
    answers_schema, build_render_payload, compute_display_state, definition_schema, render_text,
    validate,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based runner for conditional-logic surveys",
    long_about = "Runs surveys section by section, re-evaluating visibility and allowed choices after every answer"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Text,
    Json,
    State,
}

#[derive(Subcommand)]
enum Command {
    /// Fill in a survey interactively, honoring its conditional logic.
    Run {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (statuses, progress, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON on completion.
        #[arg(long)]
        answers_json: bool,
    },
    /// Lint a survey definition for broken references.
    Validate {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
    },
    /// Print the derived display state for a set of answers.
    State {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Optional JSON file containing answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Output mode.
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        format: OutputMode,
    },
    /// Export JSON schemas.
    Schema {
        /// Path to the survey definition JSON (answers schema mode).
        #[arg(long, value_name = "SURVEY")]
        survey: Option<PathBuf>,
        /// Optional JSON file containing answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Print the schema of the definition format itself.
        #[arg(long)]
        definition: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            survey,
            answers,
            verbose,
            answers_json,
        } => run_survey(survey, answers, verbose, answers_json),
        Command::Validate { survey } => run_validate(survey),
        Command::State {
            survey,
            answers,
            format,
        } => run_state(survey, answers, format),
        Command::Schema {
            survey,
            answers,
            definition,
        } => run_schema(survey, answers, definition),
    }
}

fn load_answers(path: Option<PathBuf>) -> CliResult<AnswerMap> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(AnswerMap::new()),
    }
}

fn run_survey(
    survey_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let spec_str = fs::read_to_string(&survey_path)?;
    let spec = SurveySpec::from_json(&spec_str)?;
    let initial = load_answers(answers_path)?;

    let mut session = SurveySession::with_answers(spec, initial);
    let mut presenter = SurveyPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    presenter.show_header(&session.spec().title, &session.spec().description);

    let sections = session.spec().sections();
    let section_total = sections.len();
    for (section_index, section) in sections.iter().enumerate() {
        presenter.show_section(&section.title, section_index + 1, section_total);
        let question_total = section.question_ids.len();
        for (question_index, question_id) in section.question_ids.iter().enumerate() {
            ask_question(
                &mut session,
                &presenter,
                question_id,
                question_index + 1,
                question_total,
            )?;
        }
        if verbose {
            presenter.show_status(&build_render_payload(session.spec(), session.answers()));
        }
    }

    presenter.show_status(&build_render_payload(session.spec(), session.answers()));
    let answer_set = AnswerSet {
        survey_id: session
            .spec()
            .id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        answers: Value::Object(session.answers().clone()),
        meta: None,
    };
    presenter.show_completion(&answer_set);
    Ok(())
}

fn ask_question(
    session: &mut SurveySession,
    presenter: &SurveyPresenter,
    question_id: &str,
    index: usize,
    total: usize,
) -> CliResult<()> {
    loop {
        // Visibility and allowed choices may have changed since the section
        // snapshot was taken, so both are re-read right before prompting.
        let Some(question) = session.spec().question(question_id).cloned() else {
            return Ok(());
        };
        let state = session.question_state(question_id);
        if !state.visible {
            return Ok(());
        }

        let prompt = QuestionPrompt {
            index,
            total,
            text: question.text.clone(),
            required: question.required,
            hint: type_hint(question.kind),
            choices: selectable_choices(&question, &state)
                .into_iter()
                .map(|(value, label)| format!("{} ({})", label, value))
                .collect(),
        };
        presenter.show_prompt(&prompt);

        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("survey aborted by user".into());
        }

        match parse_answer_input(&question, &state, trimmed) {
            Ok(None) => return Ok(()),
            Ok(Some(value)) => {
                let summary = session.set_answer(question_id, value);
                presenter.show_cleared(&summary.cleared);
                return Ok(());
            }
            Err(error) => presenter.show_parse_error(&error),
        }
    }
}

fn type_hint(kind: QuestionType) -> Option<String> {
    match kind {
        QuestionType::Number => Some("(number)".into()),
        QuestionType::Date => Some("(YYYY-MM-DD)".into()),
        QuestionType::Checkbox => Some("(comma-separated)".into()),
        _ => None,
    }
}

/// Currently selectable `(value, label)` pairs for a choice question.
fn selectable_choices(question: &Question, state: &QuestionState) -> Vec<(String, String)> {
    question
        .choices
        .iter()
        .filter(|choice| state.allows_choice(choice.id))
        .map(|choice| (choice.value.clone(), choice.label.clone()))
        .collect()
}

/// Turns raw input into an answer value. `Ok(None)` means the question was
/// skipped (allowed only for optional questions). Answers are stored as
/// strings (or lists of strings for multi-select), matching the shape the
/// persistence sink accepts.
fn parse_answer_input(
    question: &Question,
    state: &QuestionState,
    raw: &str,
) -> Result<Option<Value>, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        if question.required {
            return Err(AnswerParseError::new(
                "This question requires an answer.",
                None,
            ));
        }
        return Ok(None);
    }

    match question.kind {
        QuestionType::Text | QuestionType::Date => Ok(Some(Value::String(trimmed.to_string()))),
        QuestionType::Number => parse_number(trimmed).map(Some),
        QuestionType::Radio | QuestionType::Dropdown => {
            parse_single_choice(question, state, trimmed).map(Some)
        }
        QuestionType::Checkbox => parse_multi_choice(question, state, trimmed).map(Some),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Value::String(raw.to_string())),
        _ => Err(AnswerParseError::new(
            "Please enter a number.",
            Some("expected a finite number".to_string()),
        )),
    }
}

fn parse_single_choice(
    question: &Question,
    state: &QuestionState,
    raw: &str,
) -> Result<Value, AnswerParseError> {
    let selectable = selectable_choices(question, state);
    match resolve_choice(&selectable, raw) {
        Some(value) => Ok(Value::String(value)),
        None => Err(choice_error(&selectable)),
    }
}

fn parse_multi_choice(
    question: &Question,
    state: &QuestionState,
    raw: &str,
) -> Result<Value, AnswerParseError> {
    let selectable = selectable_choices(question, state);
    let mut values = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match resolve_choice(&selectable, part) {
            Some(value) => {
                if !values.iter().any(|existing| existing == &value) {
                    values.push(value);
                }
            }
            None => return Err(choice_error(&selectable)),
        }
    }
    if values.is_empty() {
        return Err(choice_error(&selectable));
    }
    Ok(Value::Array(values.into_iter().map(Value::String).collect()))
}

/// Accepts either the stored value or the display label, case-insensitive.
fn resolve_choice(selectable: &[(String, String)], raw: &str) -> Option<String> {
    selectable
        .iter()
        .find(|(value, label)| value.eq_ignore_ascii_case(raw) || label.eq_ignore_ascii_case(raw))
        .map(|(value, _)| value.clone())
}

fn choice_error(selectable: &[(String, String)]) -> AnswerParseError {
    let values = selectable
        .iter()
        .map(|(value, _)| value.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    AnswerParseError::new(
        format!("Choose one of: {}.", values),
        Some(format!("allowed values: {}", values)),
    )
}

fn run_validate(survey_path: PathBuf) -> CliResult<()> {
    let spec_json = fs::read_to_string(survey_path)?;
    let spec = SurveySpec::from_json(&spec_json)?;

    let report = validate(&spec);
    println!(
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    for error in &report.errors {
        println!(
            "  {} - {}",
            error.question_id.as_deref().unwrap_or("<unknown>"),
            error.message
        );
    }

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_state(
    survey_path: PathBuf,
    answers_path: Option<PathBuf>,
    format: OutputMode,
) -> CliResult<()> {
    let spec_str = fs::read_to_string(&survey_path)?;
    let answers = load_answers(answers_path)?;

    match format {
        OutputMode::Text => {
            let spec = SurveySpec::from_json(&spec_str)?;
            println!("{}", render_text(&build_render_payload(&spec, &answers)));
        }
        OutputMode::Json | OutputMode::State => {
            // The JSON modes go through the component facade, the same
            // surface a host UI would poll.
            let survey_id = survey_id_of(&spec_str)?;
            let config = json!({ "survey_spec_json": spec_str }).to_string();
            let answers_json = Value::Object(answers).to_string();
            let response = if format == OutputMode::Json {
                component_render(&survey_id, &config, &answers_json)
            } else {
                component_display_state(&survey_id, &config, &answers_json)
            };
            let value: Value = serde_json::from_str(&response)?;
            if let Some(error) = value.get("error").and_then(Value::as_str) {
                return Err(error.into());
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn survey_id_of(spec_str: &str) -> CliResult<String> {
    let spec_value: Value = serde_json::from_str(spec_str)?;
    match spec_value.get("id") {
        Some(Value::Number(num)) => Ok(num.to_string()),
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err("survey definition is missing an id".into()),
    }
}

fn run_schema(
    survey_path: Option<PathBuf>,
    answers_path: Option<PathBuf>,
    definition: bool,
) -> CliResult<()> {
    if definition {
        println!("{}", serde_json::to_string_pretty(&definition_schema())?);
        return Ok(());
    }

    let survey_path = survey_path.ok_or("--survey is required unless --definition is set")?;
    let spec_json = fs::read_to_string(survey_path)?;
    let spec = SurveySpec::from_json(&spec_json)?;
    let answers = load_answers(answers_path)?;
    let state = compute_display_state(&spec, &answers);
    println!(
        "{}",
        serde_json::to_string_pretty(&answers_schema(&spec, &state))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use serde_json::json;
    use std::fs;

    const FIXTURE: &str =
        include_str!("../../survey-spec/tests/fixtures/vehicle_survey.json");

    fn fixture_spec() -> SurveySpec {
        SurveySpec::from_json(FIXTURE).expect("fixture parses")
    }

    #[test]
    fn parse_answer_input_accepts_labels_case_insensitively() {
        let spec = fixture_spec();
        let question = spec.question("1").expect("question").clone();
        let state = QuestionState::default();

        let value = parse_answer_input(&question, &state, "YES").expect("parses");
        assert_eq!(value, Some(json!("yes")));
    }

    #[test]
    fn parse_answer_input_rejects_disallowed_choices() {
        let spec = fixture_spec();
        let question = spec.question("3").expect("question").clone();
        let state = QuestionState {
            visible: true,
            allowed_choices: Some([20, 21].into_iter().collect()),
        };

        assert!(parse_answer_input(&question, &state, "premium").is_err());
        let value = parse_answer_input(&question, &state, "Standard").expect("parses");
        assert_eq!(value, Some(json!("standard")));
    }

    #[test]
    fn parse_answer_input_builds_checkbox_lists() {
        let spec = fixture_spec();
        let question = spec.question("5").expect("question").clone();
        let state = QuestionState::default();

        let value =
            parse_answer_input(&question, &state, "roadside, Glass cover").expect("parses");
        assert_eq!(value, Some(json!(["roadside", "glass"])));
    }

    #[test]
    fn parse_answer_input_validates_numbers() {
        let spec = fixture_spec();
        let question = spec.question("4").expect("question").clone();
        let state = QuestionState::default();

        assert!(parse_answer_input(&question, &state, "old").is_err());
        let value = parse_answer_input(&question, &state, "12").expect("parses");
        assert_eq!(value, Some(json!("12")));
    }

    #[test]
    fn optional_questions_may_be_skipped() {
        let spec = fixture_spec();
        let question = spec.question("4").expect("question").clone();
        let state = QuestionState::default();

        let value = parse_answer_input(&question, &state, "  ").expect("parses");
        assert_eq!(value, None);
    }

    #[test]
    fn required_questions_may_not_be_skipped() {
        let spec = fixture_spec();
        let question = spec.question("1").expect("question").clone();
        let state = QuestionState::default();

        assert!(parse_answer_input(&question, &state, "").is_err());
    }

    #[test]
    fn validate_command_accepts_the_fixture() -> CliResult<()> {
        let dir = assert_fs::TempDir::new()?;
        let path = dir.path().join("survey.json");
        fs::write(&path, FIXTURE)?;

        let mut cmd = Command::cargo_bin("survey-cli")?;
        cmd.arg("validate")
            .arg("--survey")
            .arg(&path)
            .assert()
            .success()
            .stdout(predicates::str::contains("valid"));
        Ok(())
    }

    #[test]
    fn validate_command_fails_on_broken_references() -> CliResult<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("survey.json");
        let broken = json!({
            "title": "Broken",
            "questions_map": {
                "1": { "id": 1, "text": "Q1", "type": "text", "section": "S" }
            },
            "logic_map": {
                "42": [
                    { "trigger_question": "1", "operator": "eq", "value": "x", "action": "show" }
                ]
            }
        });
        fs::write(&path, broken.to_string())?;

        let mut cmd = Command::cargo_bin("survey-cli")?;
        cmd.arg("validate").arg("--survey").arg(&path).assert().failure();
        Ok(())
    }

    #[test]
    fn state_command_emits_display_state_json() -> CliResult<()> {
        let dir = tempfile::TempDir::new()?;
        let survey = dir.path().join("survey.json");
        let answers = dir.path().join("answers.json");
        fs::write(&survey, FIXTURE)?;
        fs::write(&answers, json!({ "1": "yes", "4": "15" }).to_string())?;

        let mut cmd = Command::cargo_bin("survey-cli")?;
        cmd.arg("state")
            .arg("--survey")
            .arg(&survey)
            .arg("--answers")
            .arg(&answers)
            .arg("--format")
            .arg("state")
            .assert()
            .success()
            .stdout(predicates::str::contains("allowed_choices"));
        Ok(())
    }

    #[test]
    fn schema_command_prints_the_definition_schema() -> CliResult<()> {
        let mut cmd = Command::cargo_bin("survey-cli")?;
        cmd.arg("schema")
            .arg("--definition")
            .assert()
            .success()
            .stdout(predicates::str::contains("questions_map"));
        Ok(())
    }
}
