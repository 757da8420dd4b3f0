mod ids;
pub mod question;
pub mod rule;
pub mod survey;

pub use question::{Choice, Question, QuestionType};
pub use rule::{Operator, Rule, RuleAction};
pub use survey::{SectionView, SpecError, SurveySpec, definition_schema};
