use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{
    Mode, Question, QuestionDraft, QuestionPatch, QuestionValidationError,
};

//
// ─── BANK ERRORS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question {0} not found")]
    NotFound(QuestionId),

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error(transparent)]
    Validation(#[from] QuestionValidationError),
}

/// Outcome of a batch status/stats operation.
///
/// Missing ids are collected instead of aborting, so the rest of the batch
/// is always processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub changed: Vec<QuestionId>,
    pub missing: Vec<QuestionId>,
}

impl StatusReport {
    /// True when every targeted id was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// The in-memory half of the question store: an ordered mapping from id to
/// question.
///
/// Iteration order is ascending id, which equals insertion order because ids
/// are assigned monotonically. Within one process an id is never handed out
/// twice, even after the question holding it is removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    questions: BTreeMap<QuestionId, Question>,
    next_id: u64,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self {
            questions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a bank from persisted questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two records share an id.
    pub fn from_persisted(
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<Self, BankError> {
        let mut bank = Self::new();
        for question in questions {
            let id = question.id();
            if bank.questions.contains_key(&id) {
                return Err(BankError::DuplicateId(id));
            }
            bank.next_id = bank.next_id.max(id.value() + 1);
            bank.questions.insert(id, question);
        }
        Ok(bank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Fetch a question or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::NotFound` if the id is absent.
    pub fn require(&self, id: QuestionId) -> Result<&Question, BankError> {
        self.questions.get(&id).ok_or(BankError::NotFound(id))
    }

    /// Iterate all questions in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Active questions whose type is admitted by `mode`, ascending id order.
    /// Randomizing is the session engine's concern, not the bank's.
    #[must_use]
    pub fn eligible(&self, mode: Mode) -> Vec<&Question> {
        self.questions
            .values()
            .filter(|q| q.is_active() && mode.admits(q.kind()))
            .collect()
    }

    /// Validate a draft and insert it under a fresh id.
    ///
    /// The id is `max(existing) + 1` (1 for an empty bank), kept monotonic
    /// across removals within this process.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if the draft is malformed; the bank
    /// is unchanged in that case.
    pub fn add(&mut self, draft: QuestionDraft) -> Result<&Question, QuestionValidationError> {
        let validated = draft.validate()?;

        let floor = self
            .questions
            .last_key_value()
            .map_or(1, |(id, _)| id.value() + 1);
        let id = QuestionId::new(self.next_id.max(floor));
        self.next_id = id.value() + 1;

        let question = validated.assign_id(id);
        self.questions.insert(id, question);
        Ok(&self.questions[&id])
    }

    /// Partially update an existing question; the merged record is validated
    /// exactly like `add` input.
    ///
    /// # Errors
    ///
    /// Returns `BankError::NotFound` if the id is absent, or a validation
    /// error (leaving the record untouched).
    pub fn update(
        &mut self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<&Question, BankError> {
        let question = self.questions.get_mut(&id).ok_or(BankError::NotFound(id))?;
        question.apply_patch(patch)?;
        Ok(&self.questions[&id])
    }

    /// Remove one question. Remaining ids are not renumbered.
    ///
    /// # Errors
    ///
    /// Returns `BankError::NotFound` if the id is absent.
    pub fn remove(&mut self, id: QuestionId) -> Result<Question, BankError> {
        self.questions.remove(&id).ok_or(BankError::NotFound(id))
    }

    /// Remove every question. Already-assigned ids stay burned.
    pub fn remove_all(&mut self) {
        self.questions.clear();
    }

    /// Bulk enable/disable. Each id is handled independently; missing ids are
    /// reported in the result, not raised.
    pub fn set_active(&mut self, ids: &[QuestionId], active: bool) -> StatusReport {
        self.for_each_target(ids, |q| q.set_active(active))
    }

    /// Flip each targeted question's current active flag independently.
    pub fn toggle(&mut self, ids: &[QuestionId]) -> StatusReport {
        self.for_each_target(ids, Question::toggle_active)
    }

    /// Zero attempts/correct for the targeted questions.
    pub fn reset_stats(&mut self, ids: &[QuestionId]) -> StatusReport {
        self.for_each_target(ids, Question::reset_stats)
    }

    /// Zero attempts/correct for every question.
    pub fn reset_all_stats(&mut self) {
        for question in self.questions.values_mut() {
            question.reset_stats();
        }
    }

    /// Record one graded attempt against a question.
    ///
    /// # Errors
    ///
    /// Returns `BankError::NotFound` if the id is absent.
    pub fn record_answer(
        &mut self,
        id: QuestionId,
        was_correct: bool,
    ) -> Result<&Question, BankError> {
        let question = self.questions.get_mut(&id).ok_or(BankError::NotFound(id))?;
        question.record_answer(was_correct);
        Ok(&self.questions[&id])
    }

    fn for_each_target(
        &mut self,
        ids: &[QuestionId],
        mut apply: impl FnMut(&mut Question),
    ) -> StatusReport {
        let mut report = StatusReport::default();
        for &id in ids {
            match self.questions.get_mut(&id) {
                Some(question) => {
                    apply(question);
                    report.changed.push(id);
                }
                None => report.missing.push(id),
            }
        }
        report
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionType;

    fn freeform(text: &str, answer: &str) -> QuestionDraft {
        QuestionDraft::freeform(text, answer)
    }

    fn quiz(text: &str, answer: &str) -> QuestionDraft {
        QuestionDraft::quiz(text, answer, vec!["Warsaw".into(), "Vilnius".into()])
    }

    fn seeded_bank() -> QuestionBank {
        let mut bank = QuestionBank::new();
        bank.add(freeform("Capital of Lithuania?", "Vilnius")).unwrap();
        bank.add(quiz("Capital of Latvia?", "Riga")).unwrap();
        bank.add(freeform("Capital of Estonia?", "Tallinn")).unwrap();
        bank
    }

    #[test]
    fn ids_start_at_one_and_ascend() {
        let bank = seeded_bank();
        let ids: Vec<u64> = bank.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut bank = seeded_bank();
        bank.remove(QuestionId::new(3)).unwrap();
        let id = bank.add(freeform("Capital of Poland?", "Warsaw")).unwrap().id();
        assert_eq!(id, QuestionId::new(4));
    }

    #[test]
    fn every_new_id_exceeds_all_previous_ones() {
        let mut bank = QuestionBank::new();
        let mut last = 0;
        for i in 0..10 {
            let id = bank
                .add(freeform(&format!("q{i}"), "a"))
                .unwrap()
                .id()
                .value();
            assert!(id > last);
            last = id;
            if i % 3 == 0 {
                bank.remove(QuestionId::new(id)).unwrap();
            }
        }
    }

    #[test]
    fn from_persisted_resumes_id_assignment_past_the_max() {
        let mut source = seeded_bank();
        source.remove(QuestionId::new(2)).unwrap();
        let mut bank = QuestionBank::from_persisted(source.iter().cloned()).unwrap();
        let id = bank.add(freeform("q", "a")).unwrap().id();
        assert_eq!(id, QuestionId::new(4));
    }

    #[test]
    fn from_persisted_rejects_duplicate_ids() {
        let bank = seeded_bank();
        let question = bank.get(QuestionId::new(1)).unwrap().clone();
        let err = QuestionBank::from_persisted(vec![question.clone(), question]).unwrap_err();
        assert_eq!(err, BankError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn eligible_filters_by_mode_and_active_flag() {
        let mut bank = seeded_bank();
        bank.set_active(&[QuestionId::new(1)], false);

        let mixed: Vec<_> = bank.eligible(Mode::Mixed).iter().map(|q| q.id()).collect();
        assert_eq!(mixed, vec![QuestionId::new(2), QuestionId::new(3)]);

        let quiz_only: Vec<_> = bank.eligible(Mode::Quiz).iter().map(|q| q.id()).collect();
        assert_eq!(quiz_only, vec![QuestionId::new(2)]);

        let freeform_only: Vec<_> = bank
            .eligible(Mode::Freeform)
            .iter()
            .map(|q| q.id())
            .collect();
        assert_eq!(freeform_only, vec![QuestionId::new(3)]);
    }

    #[test]
    fn toggle_reports_missing_ids_and_still_flips_the_rest() {
        let mut bank = seeded_bank();
        bank.remove(QuestionId::new(3)).unwrap();
        bank.remove(QuestionId::new(1)).unwrap();

        let report = bank.toggle(&[QuestionId::new(2), QuestionId::new(99)]);
        assert_eq!(report.changed, vec![QuestionId::new(2)]);
        assert_eq!(report.missing, vec![QuestionId::new(99)]);
        assert!(!report.is_clean());
        assert!(!bank.get(QuestionId::new(2)).unwrap().is_active());
    }

    #[test]
    fn remove_unknown_id_is_not_found_and_leaves_bank_unchanged() {
        let mut bank = seeded_bank();
        let before = bank.clone();
        let err = bank.remove(QuestionId::new(99)).unwrap_err();
        assert_eq!(err, BankError::NotFound(QuestionId::new(99)));
        assert_eq!(bank, before);
    }

    #[test]
    fn update_revalidates_the_merged_record() {
        let mut bank = seeded_bank();
        let err = bank
            .update(
                QuestionId::new(2),
                QuestionPatch {
                    choices: Some(Vec::new()),
                    ..QuestionPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BankError::Validation(_)));
        // still a quiz with its original choices
        assert_eq!(bank.get(QuestionId::new(2)).unwrap().choices().len(), 2);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut bank = seeded_bank();
        let err = bank
            .update(QuestionId::new(42), QuestionPatch::default())
            .unwrap_err();
        assert_eq!(err, BankError::NotFound(QuestionId::new(42)));
    }

    #[test]
    fn reset_stats_zeroes_targeted_counters_only() {
        let mut bank = seeded_bank();
        bank.record_answer(QuestionId::new(1), true).unwrap();
        bank.record_answer(QuestionId::new(2), false).unwrap();

        bank.reset_stats(&[QuestionId::new(1)]);
        assert_eq!(bank.get(QuestionId::new(1)).unwrap().attempts(), 0);
        assert_eq!(bank.get(QuestionId::new(2)).unwrap().attempts(), 1);

        bank.reset_all_stats();
        assert_eq!(bank.get(QuestionId::new(2)).unwrap().attempts(), 0);
    }

    #[test]
    fn remove_all_keeps_burned_ids() {
        let mut bank = seeded_bank();
        bank.remove_all();
        assert!(bank.is_empty());
        let id = bank.add(quiz("Capital of Latvia?", "Riga")).unwrap().id();
        assert_eq!(id, QuestionId::new(4));
    }

    #[test]
    fn counters_stay_consistent_across_operation_sequences() {
        let mut bank = seeded_bank();
        for i in 0..20 {
            let id = QuestionId::new(1 + (i % 3));
            bank.record_answer(id, i % 2 == 0).unwrap();
        }
        bank.reset_stats(&[QuestionId::new(2)]);
        bank.record_answer(QuestionId::new(2), true).unwrap();

        for question in bank.iter() {
            assert!(question.correct() <= question.attempts());
            assert_eq!(question.kind() == QuestionType::Freeform, question.choices().is_empty());
        }
    }
}
