use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Mode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionOutcomeError {
    #[error("finished_at is before started_at")]
    InvalidTimeRange,
}

/// One graded prompt within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub question_id: QuestionId,
    pub response: String,
    pub was_correct: bool,
}

/// Final record of a session run: the ordered graded entries plus the
/// derived score.
///
/// Produced for both test and practice; only test outcomes reach the
/// results file. Cancelled sessions simply carry fewer entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    mode: Mode,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    entries: Vec<SessionEntry>,
}

impl SessionOutcome {
    /// Build an outcome from graded entries.
    ///
    /// # Errors
    ///
    /// Returns `SessionOutcomeError::InvalidTimeRange` if `finished_at` is
    /// before `started_at`.
    pub fn new(
        mode: Mode,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        entries: Vec<SessionEntry>,
    ) -> Result<Self, SessionOutcomeError> {
        if finished_at < started_at {
            return Err(SessionOutcomeError::InvalidTimeRange);
        }
        Ok(Self {
            mode,
            started_at,
            finished_at,
            entries,
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.entries.iter().filter(|e| e.was_correct).count()
    }

    /// `correct / total`, or `None` when nothing was graded — callers must
    /// check the question count before reading a score.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        if self.entries.is_empty() {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.correct_count() as f64 / self.entries.len() as f64)
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}
