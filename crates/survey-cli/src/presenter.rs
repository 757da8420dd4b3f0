use std::fmt::Write;

use survey_spec::{AnswerSet, RenderPayload, RenderStatus};

/// Controls which bits of state the runner prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, visible questions, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Raised when typed input cannot be turned into an answer value.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        AnswerParseError {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Prompt context for a single question.
pub struct QuestionPrompt {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

/// Prints survey progress and prompts once the engine yields state.
pub struct SurveyPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl SurveyPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        SurveyPresenter {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, title: &str, description: &str) {
        if self.header_printed {
            return;
        }
        println!("Survey: {}", title);
        if self.verbosity.is_verbose() && !description.is_empty() {
            println!("About: {}", description);
        }
        self.header_printed = true;
    }

    pub fn show_section(&self, title: &str, index: usize, total: usize) {
        println!("== {} ({}/{})", title, index, total);
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status.as_str(),
                payload.progress.answered,
                payload.progress.total
            );
        } else if payload.status == RenderStatus::NeedInput && payload.visible_count() == 0 {
            println!("No visible questions are available; check the conditional logic.");
        }
    }

    pub fn show_prompt(&self, prompt: &QuestionPrompt) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.text)
        } else {
            format!("{} {}", prompt.index, prompt.text)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_cleared(&self, cleared: &[String]) {
        if cleared.is_empty() {
            return;
        }
        println!(
            "Note: earlier selections were removed for question(s) {} because the allowed choices changed.",
            cleared.join(", ")
        );
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(error) => {
                eprintln!("Failed to encode answers: {}", error);
            }
        }
        if self.show_answers_json {
            match serde_json::to_string_pretty(&answer_set.answers) {
                Ok(text) => println!("Answers (JSON):\n{}", text),
                Err(error) => eprintln!("Failed to encode answers JSON: {}", error),
            }
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_hex_formats_bytes() {
        assert_eq!(encode_hex(&[0x00, 0xff, 0x10]), "00ff10");
    }

    #[test]
    fn verbosity_maps_from_flag() {
        assert!(Verbosity::from_verbose(true).is_verbose());
        assert!(!Verbosity::from_verbose(false).is_verbose());
    }
}
