use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use quiz_core::model::{QuestionBank, SessionOutcome};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("corrupt bank file at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// Repository contract for the durable question bank.
///
/// The bank file format is a swappable strategy: the bank logic only sees
/// `load`/`save`, so the flat-file backend could be replaced by an embedded
/// key-value store without touching it. Single-process access is assumed —
/// no lock is taken, and concurrent writers against the same backing file
/// are undefined behavior.
pub trait BankRepository: Send + Sync {
    /// Deserialize the full bank. An absent backing file yields an empty
    /// bank, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file exists but cannot be read or
    /// parsed. A load failure is fatal for any store-dependent command.
    fn load(&self) -> Result<QuestionBank, StorageError>;

    /// Serialize the full bank atomically (write-temp-then-replace), so a
    /// crash mid-write never corrupts the existing file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be written.
    fn save(&self, bank: &QuestionBank) -> Result<(), StorageError>;
}

/// Append-or-create sink for completed test-session outcomes.
pub trait ResultsLog: Send + Sync {
    /// Append one session outcome.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the line cannot be written.
    fn append(&self, outcome: &SessionOutcome) -> Result<(), StorageError>;
}

/// In-memory repository for tests and prototyping.
///
/// Holds the last saved snapshot; `fail_saves` lets tests exercise the
/// save-error tolerance path.
#[derive(Default)]
pub struct InMemoryRepository {
    snapshot: Mutex<Option<QuestionBank>>,
    fail_saves: AtomicBool,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent `save` fails with `StorageError::Backend`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of questions in the last saved snapshot, if any.
    #[must_use]
    pub fn snapshot_len(&self) -> Option<usize> {
        self.snapshot
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(QuestionBank::len))
    }
}

impl BankRepository for InMemoryRepository {
    fn load(&self) -> Result<QuestionBank, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("save failure injected".into()));
        }
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        *guard = Some(bank.clone());
        Ok(())
    }
}

/// In-memory results sink for tests.
#[derive(Default)]
pub struct MemoryResultsLog {
    outcomes: Mutex<Vec<SessionOutcome>>,
}

impl MemoryResultsLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of everything appended so far.
    ///
    /// # Panics
    ///
    /// Panics if the inner lock is poisoned (test helper only).
    #[must_use]
    pub fn recorded(&self) -> Vec<SessionOutcome> {
        self.outcomes.lock().expect("results lock poisoned").clone()
    }
}

impl ResultsLog for MemoryResultsLog {
    fn append(&self, outcome: &SessionOutcome) -> Result<(), StorageError> {
        let mut guard = self
            .outcomes
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        guard.push(outcome.clone());
        Ok(())
    }
}
