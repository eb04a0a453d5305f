//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, QuestionValidationError, SessionOutcomeError};
use storage::StorageError;

/// Errors emitted by `BankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankServiceError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<QuestionValidationError> for BankServiceError {
    fn from(err: QuestionValidationError) -> Self {
        Self::Bank(err.into())
    }
}

/// Errors emitted by the session engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no eligible active questions for the requested mode")]
    EmptyPool,

    #[error("requested a test with zero questions")]
    EmptyRequest,

    #[error("no prompt is awaiting an answer")]
    NoPendingPrompt,

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Outcome(#[from] SessionOutcomeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
