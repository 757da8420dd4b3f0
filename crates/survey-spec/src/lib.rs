#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod logic;
pub mod render;
pub mod session;
pub mod spec;
pub mod validate;

pub use answers::{AnswerMap, AnswerSet, Meta, answer_text, is_answered};
pub use answers_schema::generate as answers_schema;
pub use logic::{
    DisplayState, QuestionState, VisibilityMap, compute_display_state, evaluate,
    evaluate_question, matches,
};
pub use render::{
    RenderChoice, RenderPayload, RenderProgress, RenderQuestion, RenderSection, RenderStatus,
    build_render_payload, render_json_ui, render_text,
};
pub use session::{ChangeSummary, SurveySession};
pub use spec::{
    Choice, Operator, Question, QuestionType, Rule, RuleAction, SectionView, SpecError,
    SurveySpec, definition_schema,
};
pub use validate::{ValidationError, ValidationReport, validate};
