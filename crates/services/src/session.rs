use chrono::{DateTime, Utc};
use tracing::{info, warn};

use quiz_core::model::{Mode, QuestionId, QuestionType, SessionEntry, SessionOutcome};
use storage::{ResultsLog, StorageError};

use crate::bank_service::BankService;
use crate::error::{BankServiceError, SessionError};
use crate::sampler::Sampler;

//
// ─── SESSION TYPES ─────────────────────────────────────────────────────────────
//

/// Bounded scored run, or unbounded run until the caller cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Test { limit: u32 },
    Practice,
}

/// One question as presented to the caller.
///
/// `options` is set for quiz questions only: the stored choices with the
/// canonical answer mixed in, shuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub question_id: QuestionId,
    pub number: usize,
    pub text: String,
    pub options: Option<Vec<String>>,
}

/// Result of grading one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: QuestionId,
    pub response: String,
    pub was_correct: bool,
    pub expected: String,
}

/// What `finish` hands back: the outcome plus any persistence failure that
/// was tolerated along the way. The score stays readable either way.
#[derive(Debug)]
pub struct SessionClose {
    pub outcome: SessionOutcome,
    pub save_error: Option<StorageError>,
}

//
// ─── SESSION ENGINE ────────────────────────────────────────────────────────────
//

/// Drives one session through `Selecting → Presenting → Grading → … →
/// Finishing`.
///
/// The engine never creates, removes or reorders questions; it borrows the
/// store to select and to increment the counters of what it graded. The
/// suspension point is between `next_prompt` and `submit`: the engine does
/// nothing while the caller blocks on terminal input.
#[derive(Debug)]
pub struct SessionEngine {
    kind: SessionKind,
    mode: Mode,
    /// Test: the randomized no-replacement draw, consumed front to back.
    queue: Vec<QuestionId>,
    /// Practice: the full eligible pool, resampled every iteration.
    pool: Vec<QuestionId>,
    cursor: usize,
    pending: Option<Prompt>,
    entries: Vec<SessionEntry>,
    sampler: Sampler,
    started_at: DateTime<Utc>,
    deferred_save_error: Option<StorageError>,
}

impl SessionEngine {
    /// Select the session's question set and enter the presenting loop.
    ///
    /// Test mode draws `min(limit, pool)` questions without replacement in
    /// randomized order; practice keeps the whole pool and resamples
    /// uniformly (with replacement across iterations), so it can run
    /// indefinitely even with a small bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRequest` for a test with `limit = 0` and
    /// `SessionError::EmptyPool` when no active question matches the mode;
    /// in both cases the session never starts.
    pub fn start(
        kind: SessionKind,
        mode: Mode,
        store: &BankService,
        mut sampler: Sampler,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if matches!(kind, SessionKind::Test { limit: 0 }) {
            return Err(SessionError::EmptyRequest);
        }

        let pool: Vec<QuestionId> = store
            .bank()
            .eligible(mode)
            .iter()
            .map(|question| question.id())
            .collect();
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let queue = match kind {
            SessionKind::Test { limit } => sampler
                .draw(pool.len(), limit as usize)
                .into_iter()
                .map(|index| pool[index])
                .collect(),
            SessionKind::Practice => Vec::new(),
        };

        info!(
            mode = %mode,
            pool = pool.len(),
            drawn = queue.len(),
            "session started"
        );

        Ok(Self {
            kind,
            mode,
            queue,
            pool,
            cursor: 0,
            pending: None,
            entries: Vec::new(),
            sampler,
            started_at,
            deferred_save_error: None,
        })
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of questions drawn for a test; `None` for practice.
    #[must_use]
    pub fn planned_total(&self) -> Option<usize> {
        match self.kind {
            SessionKind::Test { .. } => Some(self.queue.len()),
            SessionKind::Practice => None,
        }
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }

    /// Yield the next question, or `None` once a test is exhausted.
    ///
    /// Calling again before `submit` re-presents the same prompt (with the
    /// same shuffled options).
    pub fn next_prompt(&mut self, store: &BankService) -> Option<Prompt> {
        if let Some(pending) = &self.pending {
            return Some(pending.clone());
        }

        let id = match self.kind {
            SessionKind::Test { .. } => *self.queue.get(self.cursor)?,
            SessionKind::Practice => {
                let index = self.sampler.pick(self.pool.len())?;
                self.pool[index]
            }
        };

        let question = store.bank().get(id)?;
        let options = match question.kind() {
            QuestionType::Freeform => None,
            QuestionType::Quiz => {
                let mut options: Vec<String> = question.choices().to_vec();
                if !options.iter().any(|choice| choice == question.answer()) {
                    options.push(question.answer().to_owned());
                }
                self.sampler.shuffle(&mut options);
                Some(options)
            }
        };

        let prompt = Prompt {
            question_id: id,
            number: self.entries.len() + 1,
            text: question.text().to_owned(),
            options,
        };
        self.pending = Some(prompt.clone());
        Some(prompt)
    }

    /// Grade the pending prompt against the caller's raw answer.
    ///
    /// Freeform: trimmed, case-insensitive comparison with the canonical
    /// answer. Quiz: the submission must exactly match one of the presented
    /// options and match the answer under the same normalization. The
    /// attempt is recorded against the store; a failed per-answer save is
    /// logged and deferred rather than failing the grade, since the
    /// increment is already applied in memory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoPendingPrompt` if nothing was presented, or
    /// a bank error if the question vanished from the store.
    pub fn submit(
        &mut self,
        store: &mut BankService,
        raw: &str,
    ) -> Result<GradedAnswer, SessionError> {
        let pending = self.pending.take().ok_or(SessionError::NoPendingPrompt)?;
        let response = raw.trim().to_owned();

        let (expected, was_correct) = {
            let question = store.bank().require(pending.question_id)?;
            let matches_answer = normalized_eq(&response, question.answer());
            let was_correct = match &pending.options {
                Some(options) => {
                    options.iter().any(|option| option == &response) && matches_answer
                }
                None => matches_answer,
            };
            (question.answer().to_owned(), was_correct)
        };

        if let Err(err) = store.record_answer(pending.question_id, was_correct) {
            match err {
                BankServiceError::Storage(err) => {
                    warn!(error = %err, "per-answer save failed, keeping in-memory result");
                    self.deferred_save_error.get_or_insert(err);
                }
                BankServiceError::Bank(err) => return Err(err.into()),
            }
        }

        self.entries.push(SessionEntry {
            question_id: pending.question_id,
            response: response.clone(),
            was_correct,
        });
        if matches!(self.kind, SessionKind::Test { .. }) {
            self.cursor += 1;
        }

        Ok(GradedAnswer {
            question_id: pending.question_id,
            response,
            was_correct,
            expected,
        })
    }

    /// Discard the in-flight unanswered prompt. Cancellation is a normal
    /// termination: already-graded entries stay recorded.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Flush the store, persist the outcome (test mode only) and report
    /// `Done`.
    ///
    /// Persistence failures are carried in `SessionClose::save_error`
    /// instead of masking the outcome: the caller still sees the score when
    /// the disk write failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Outcome` only if the clock ran backwards.
    pub fn finish(
        mut self,
        store: &mut BankService,
        results: Option<&dyn ResultsLog>,
        finished_at: DateTime<Utc>,
    ) -> Result<SessionClose, SessionError> {
        self.pending = None;

        let mut save_error = self.deferred_save_error.take();
        if let Err(err) = store.save() {
            warn!(error = %err, "final bank flush failed");
            if let BankServiceError::Storage(err) = err {
                save_error.get_or_insert(err);
            }
        }

        let outcome =
            SessionOutcome::new(self.mode, self.started_at, finished_at, self.entries)?;

        if matches!(self.kind, SessionKind::Test { .. }) {
            if let Some(results) = results {
                if let Err(err) = results.append(&outcome) {
                    warn!(error = %err, "results append failed");
                    save_error.get_or_insert(err);
                }
            }
        }

        info!(
            answered = outcome.total(),
            correct = outcome.correct_count(),
            "session finished"
        );

        Ok(SessionClose {
            outcome,
            save_error,
        })
    }
}

fn normalized_eq(submitted: &str, canonical: &str) -> bool {
    submitted.trim().to_lowercase() == canonical.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
