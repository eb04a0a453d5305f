mod bank;
mod ids;
mod question;
mod session;

pub use bank::{BankError, QuestionBank, StatusReport};
pub use ids::QuestionId;
pub use question::{
    Mode, Question, QuestionDraft, QuestionPatch, QuestionType, QuestionValidationError,
    UnknownMode, UnknownQuestionType, ValidatedQuestion,
};
pub use session::{SessionEntry, SessionOutcome, SessionOutcomeError};
