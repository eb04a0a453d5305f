use std::sync::Arc;

use tracing::debug;

use quiz_core::model::{
    Question, QuestionBank, QuestionDraft, QuestionId, QuestionPatch, StatusReport,
};
use storage::BankRepository;

use crate::error::BankServiceError;

/// The durable question store: the in-memory bank plus its repository.
///
/// Loaded once at open. Every mutating operation persists the whole bank
/// atomically before reporting success, so a kill between commands loses at
/// most the operation in flight and never corrupts the file.
pub struct BankService {
    repo: Arc<dyn BankRepository>,
    bank: QuestionBank,
}

impl BankService {
    /// Load the bank from the repository.
    ///
    /// # Errors
    ///
    /// Returns `BankServiceError::Storage` if the backing file exists but
    /// cannot be read or parsed.
    pub fn open(repo: Arc<dyn BankRepository>) -> Result<Self, BankServiceError> {
        let bank = repo.load()?;
        debug!(questions = bank.len(), "question store opened");
        Ok(Self { repo, bank })
    }

    /// Read access for the session engine and the stats reporter.
    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Validate and insert a new question under a fresh id, then persist.
    ///
    /// # Errors
    ///
    /// Returns a validation error (store unchanged) or a storage error from
    /// the persist step.
    pub fn add(&mut self, draft: QuestionDraft) -> Result<Question, BankServiceError> {
        let question = self.bank.add(draft).map_err(BankServiceError::from)?.clone();
        self.repo.save(&self.bank)?;
        Ok(question)
    }

    /// Partially update an existing question, then persist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, a validation error for a bad
    /// merged record, or a storage error from the persist step.
    pub fn update(
        &mut self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question, BankServiceError> {
        let question = self.bank.update(id, patch)?.clone();
        self.repo.save(&self.bank)?;
        Ok(question)
    }

    /// Remove one question, then persist. Remaining ids are not renumbered.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or a storage error.
    pub fn remove(&mut self, id: QuestionId) -> Result<Question, BankServiceError> {
        let removed = self.bank.remove(id)?;
        self.repo.save(&self.bank)?;
        Ok(removed)
    }

    /// Remove every question, then persist. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persist step.
    pub fn remove_all(&mut self) -> Result<usize, BankServiceError> {
        let removed = self.bank.len();
        self.bank.remove_all();
        self.repo.save(&self.bank)?;
        Ok(removed)
    }

    /// Bulk enable/disable; missing ids are reported, not raised.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persist step.
    pub fn set_active(
        &mut self,
        ids: &[QuestionId],
        active: bool,
    ) -> Result<StatusReport, BankServiceError> {
        let report = self.bank.set_active(ids, active);
        self.persist_if_changed(&report)?;
        Ok(report)
    }

    /// Flip each targeted question's active flag independently.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persist step.
    pub fn toggle(&mut self, ids: &[QuestionId]) -> Result<StatusReport, BankServiceError> {
        let report = self.bank.toggle(ids);
        self.persist_if_changed(&report)?;
        Ok(report)
    }

    /// Zero attempts/correct for the targeted questions.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persist step.
    pub fn reset_stats(&mut self, ids: &[QuestionId]) -> Result<StatusReport, BankServiceError> {
        let report = self.bank.reset_stats(ids);
        self.persist_if_changed(&report)?;
        Ok(report)
    }

    /// Zero attempts/correct for every question.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persist step.
    pub fn reset_all_stats(&mut self) -> Result<(), BankServiceError> {
        self.bank.reset_all_stats();
        self.repo.save(&self.bank)?;
        Ok(())
    }

    /// Record one graded attempt and persist.
    ///
    /// The in-memory increment is applied first and survives a failed save;
    /// the session outcome must stay readable even when persistence fails.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or a storage error from the
    /// persist step.
    pub fn record_answer(
        &mut self,
        id: QuestionId,
        was_correct: bool,
    ) -> Result<(), BankServiceError> {
        self.bank.record_answer(id, was_correct)?;
        self.repo.save(&self.bank)?;
        Ok(())
    }

    /// Flush the current bank to the repository.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the bank cannot be written.
    pub fn save(&self) -> Result<(), BankServiceError> {
        self.repo.save(&self.bank)?;
        Ok(())
    }

    fn persist_if_changed(&self, report: &StatusReport) -> Result<(), BankServiceError> {
        if report.changed.is_empty() {
            return Ok(());
        }
        self.repo.save(&self.bank)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::BankError;
    use storage::InMemoryRepository;

    fn open_store() -> (Arc<InMemoryRepository>, BankService) {
        let repo = Arc::new(InMemoryRepository::new());
        let store = BankService::open(Arc::clone(&repo) as Arc<dyn BankRepository>).unwrap();
        (repo, store)
    }

    #[test]
    fn add_persists_before_returning() {
        let (repo, mut store) = open_store();
        store
            .add(QuestionDraft::freeform("Capital of Lithuania?", "Vilnius"))
            .unwrap();
        assert_eq!(repo.snapshot_len(), Some(1));
    }

    #[test]
    fn validation_failure_leaves_store_and_snapshot_untouched() {
        let (repo, mut store) = open_store();
        let err = store
            .add(QuestionDraft::freeform("  ", "Vilnius"))
            .unwrap_err();
        assert!(matches!(err, BankServiceError::Bank(_)));
        assert!(store.bank().is_empty());
        assert_eq!(repo.snapshot_len(), None);
    }

    #[test]
    fn batch_with_only_missing_ids_skips_the_save() {
        let (repo, mut store) = open_store();
        let report = store.toggle(&[QuestionId::new(9)]).unwrap();
        assert_eq!(report.missing, vec![QuestionId::new(9)]);
        assert_eq!(repo.snapshot_len(), None);
    }

    #[test]
    fn record_answer_keeps_increment_when_save_fails() {
        let (repo, mut store) = open_store();
        let id = store
            .add(QuestionDraft::freeform("Capital of Latvia?", "Riga"))
            .unwrap()
            .id();

        repo.set_fail_saves(true);
        let err = store.record_answer(id, true).unwrap_err();
        assert!(matches!(err, BankServiceError::Storage(_)));
        assert_eq!(store.bank().get(id).unwrap().attempts(), 1);
        assert_eq!(store.bank().get(id).unwrap().correct(), 1);
    }

    #[test]
    fn remove_all_reports_the_removed_count() {
        let (_repo, mut store) = open_store();
        store
            .add(QuestionDraft::freeform("q1", "a"))
            .unwrap();
        store
            .add(QuestionDraft::freeform("q2", "a"))
            .unwrap();
        assert_eq!(store.remove_all().unwrap(), 2);
        assert!(store.bank().is_empty());
    }
}
