use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION KIND & MODE ──────────────────────────────────────────────────────
//

/// Kind of a question: freeform text answer, or multiple choice ("quiz").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Freeform,
    Quiz,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Freeform => "freeform",
            QuestionType::Quiz => "quiz",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question type: {0}")]
pub struct UnknownQuestionType(String);

impl FromStr for QuestionType {
    type Err = UnknownQuestionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "freeform" => Ok(QuestionType::Freeform),
            "quiz" => Ok(QuestionType::Quiz),
            other => Err(UnknownQuestionType(other.to_owned())),
        }
    }
}

/// Selection filter over question types applied when building a session pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Freeform,
    Quiz,
    #[default]
    Mixed,
}

impl Mode {
    /// Whether a question of the given type is eligible under this mode.
    #[must_use]
    pub fn admits(&self, kind: QuestionType) -> bool {
        match self {
            Mode::Mixed => true,
            Mode::Freeform => kind == QuestionType::Freeform,
            Mode::Quiz => kind == QuestionType::Quiz,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Freeform => "freeform",
            Mode::Quiz => "quiz",
            Mode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mode: {0} (expected freeform, quiz or mixed)")]
pub struct UnknownMode(String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "freeform" => Ok(Mode::Freeform),
            "quiz" => Ok(Mode::Quiz),
            "mixed" => Ok(Mode::Mixed),
            other => Err(UnknownMode(other.to_owned())),
        }
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("question text is empty")]
    EmptyText,

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("quiz questions need at least 2 choices, got {got}")]
    TooFewChoices { got: usize },

    #[error("freeform questions cannot carry choices")]
    ChoicesOnFreeform,

    #[error("choice {choice:?} contains the reserved '|' separator")]
    ReservedChoiceSeparator { choice: String },

    #[error("persisted counters are inconsistent: correct {correct} > attempts {attempts}")]
    CounterMismatch { attempts: u32, correct: u32 },
}

//
// ─── DRAFT → VALIDATED → QUESTION ──────────────────────────────────────────────
//

/// Unvalidated question fields as authored by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub answer: String,
    pub choices: Vec<String>,
    pub kind: QuestionType,
}

impl QuestionDraft {
    #[must_use]
    pub fn freeform(text: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: answer.into(),
            choices: Vec::new(),
            kind: QuestionType::Freeform,
        }
    }

    #[must_use]
    pub fn quiz(
        text: impl Into<String>,
        answer: impl Into<String>,
        choices: Vec<String>,
    ) -> Self {
        Self {
            text: text.into(),
            answer: answer.into(),
            choices,
            kind: QuestionType::Quiz,
        }
    }

    /// Validate the draft into a question that only lacks an id.
    ///
    /// Text, answer and each choice are trimmed; blank choices are dropped
    /// before the shape check, matching the authoring template where empty
    /// entries between delimiters are noise.
    ///
    /// `|` is reserved as the choices separator (authoring template and
    /// bank file alike), so it is rejected inside choice texts.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if text or answer are blank, a quiz
    /// draft has fewer than 2 choices, a freeform draft carries choices, or
    /// a choice contains `|`.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionValidationError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(QuestionValidationError::EmptyText);
        }

        let answer = self.answer.trim().to_owned();
        if answer.is_empty() {
            return Err(QuestionValidationError::EmptyAnswer);
        }

        let choices: Vec<String> = self
            .choices
            .iter()
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .collect();

        match self.kind {
            QuestionType::Freeform if !choices.is_empty() => {
                return Err(QuestionValidationError::ChoicesOnFreeform);
            }
            QuestionType::Quiz if choices.len() < 2 => {
                return Err(QuestionValidationError::TooFewChoices { got: choices.len() });
            }
            _ => {}
        }

        if let Some(choice) = choices.iter().find(|c| c.contains('|')) {
            return Err(QuestionValidationError::ReservedChoiceSeparator {
                choice: choice.clone(),
            });
        }

        Ok(ValidatedQuestion {
            text,
            answer,
            choices,
            kind: self.kind,
        })
    }
}

/// A question that passed validation but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    text: String,
    answer: String,
    choices: Vec<String>,
    kind: QuestionType,
}

impl ValidatedQuestion {
    /// Attach a bank-assigned id, producing a live question with zeroed
    /// counters and active status.
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            text: self.text,
            answer: self.answer,
            choices: self.choices,
            kind: self.kind,
            active: true,
            attempts: 0,
            correct: 0,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Partial update of a question; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub answer: Option<String>,
    pub choices: Option<Vec<String>>,
    pub kind: Option<QuestionType>,
}

/// A stored quiz question with its per-question statistics.
///
/// Fields are private so the invariants (non-blank text/answer, choices
/// shape matching the kind, `correct <= attempts`) hold for every reachable
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    answer: String,
    choices: Vec<String>,
    kind: QuestionType,
    active: bool,
    attempts: u32,
    correct: u32,
}

impl Question {
    /// Rehydrate a question from persisted storage, re-checking every
    /// invariant.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if the stored fields fail the same
    /// validation applied at authoring time, or if `correct > attempts`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        text: String,
        answer: String,
        choices: Vec<String>,
        kind: QuestionType,
        active: bool,
        attempts: u32,
        correct: u32,
    ) -> Result<Self, QuestionValidationError> {
        if correct > attempts {
            return Err(QuestionValidationError::CounterMismatch { attempts, correct });
        }

        let validated = QuestionDraft {
            text,
            answer,
            choices,
            kind,
        }
        .validate()?;

        let mut question = validated.assign_id(id);
        question.active = active;
        question.attempts = attempts;
        question.correct = correct;
        Ok(question)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Fraction of attempts answered correctly, `None` before any attempt.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(f64::from(self.correct) / f64::from(self.attempts))
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn toggle_active(&mut self) {
        self.active = !self.active;
    }

    pub fn reset_stats(&mut self) {
        self.attempts = 0;
        self.correct = 0;
    }

    /// Record one graded attempt. `attempts` always grows; `correct` only
    /// when the answer was right, so `correct <= attempts` is preserved.
    pub fn record_answer(&mut self, was_correct: bool) {
        self.attempts = self.attempts.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Apply a partial update, re-validating the merged record.
    ///
    /// Id, active status and counters are untouched. On validation failure
    /// the question is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if the merged fields are invalid.
    pub fn apply_patch(&mut self, patch: QuestionPatch) -> Result<(), QuestionValidationError> {
        let merged = QuestionDraft {
            text: patch.text.unwrap_or_else(|| self.text.clone()),
            answer: patch.answer.unwrap_or_else(|| self.answer.clone()),
            choices: patch.choices.unwrap_or_else(|| self.choices.clone()),
            kind: patch.kind.unwrap_or(self.kind),
        };
        let validated = merged.validate()?;

        self.text = validated.text;
        self.answer = validated.answer;
        self.choices = validated.choices;
        self.kind = validated.kind;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Question {
        QuestionDraft::quiz(
            "Capital of Latvia?",
            "Riga",
            vec!["Warsaw".into(), "Vilnius".into(), "Tallinn".into()],
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(1))
    }

    #[test]
    fn draft_fails_if_text_blank() {
        let err = QuestionDraft::freeform("   ", "Vilnius").validate().unwrap_err();
        assert_eq!(err, QuestionValidationError::EmptyText);
    }

    #[test]
    fn draft_fails_if_answer_blank() {
        let err = QuestionDraft::freeform("Capital?", " ").validate().unwrap_err();
        assert_eq!(err, QuestionValidationError::EmptyAnswer);
    }

    #[test]
    fn quiz_draft_needs_two_choices() {
        let err = QuestionDraft::quiz("Capital?", "Riga", vec!["Riga".into()])
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionValidationError::TooFewChoices { got: 1 });
    }

    #[test]
    fn blank_choices_are_dropped_before_the_shape_check() {
        let err = QuestionDraft::quiz(
            "Capital?",
            "Riga",
            vec!["Riga".into(), "  ".into(), String::new()],
        )
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionValidationError::TooFewChoices { got: 1 });
    }

    #[test]
    fn choice_text_cannot_contain_the_separator() {
        let err = QuestionDraft::quiz(
            "Capital of Latvia?",
            "Riga",
            vec!["Riga".into(), "Warsaw|Vilnius".into()],
        )
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            QuestionValidationError::ReservedChoiceSeparator {
                choice: "Warsaw|Vilnius".into()
            }
        );
    }

    #[test]
    fn freeform_draft_rejects_choices() {
        let draft = QuestionDraft {
            text: "Capital?".into(),
            answer: "Riga".into(),
            choices: vec!["Riga".into(), "Warsaw".into()],
            kind: QuestionType::Freeform,
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            QuestionValidationError::ChoicesOnFreeform
        );
    }

    #[test]
    fn valid_draft_assigns_id_with_zero_counters() {
        let question = sample_quiz();
        assert_eq!(question.id(), QuestionId::new(1));
        assert!(question.is_active());
        assert_eq!(question.attempts(), 0);
        assert_eq!(question.correct(), 0);
        assert_eq!(question.accuracy(), None);
    }

    #[test]
    fn record_answer_preserves_counter_invariant() {
        let mut question = sample_quiz();
        question.record_answer(false);
        question.record_answer(true);
        question.record_answer(true);
        assert_eq!(question.attempts(), 3);
        assert_eq!(question.correct(), 2);
        assert!(question.correct() <= question.attempts());
        assert_eq!(question.accuracy(), Some(2.0 / 3.0));
    }

    #[test]
    fn patch_merges_and_revalidates() {
        let mut question = sample_quiz();
        question.record_answer(true);

        question
            .apply_patch(QuestionPatch {
                text: Some("Capital of Estonia?".into()),
                answer: Some("Tallinn".into()),
                ..QuestionPatch::default()
            })
            .unwrap();

        assert_eq!(question.text(), "Capital of Estonia?");
        assert_eq!(question.answer(), "Tallinn");
        // untouched parts survive, including counters
        assert_eq!(question.kind(), QuestionType::Quiz);
        assert_eq!(question.attempts(), 1);
    }

    #[test]
    fn invalid_patch_leaves_question_unchanged() {
        let mut question = sample_quiz();
        let before = question.clone();

        let err = question
            .apply_patch(QuestionPatch {
                kind: Some(QuestionType::Freeform),
                ..QuestionPatch::default()
            })
            .unwrap_err();

        assert_eq!(err, QuestionValidationError::ChoicesOnFreeform);
        assert_eq!(question, before);
    }

    #[test]
    fn patch_can_switch_type_when_choices_follow() {
        let mut question = sample_quiz();
        question
            .apply_patch(QuestionPatch {
                kind: Some(QuestionType::Freeform),
                choices: Some(Vec::new()),
                ..QuestionPatch::default()
            })
            .unwrap();
        assert_eq!(question.kind(), QuestionType::Freeform);
        assert!(question.choices().is_empty());
    }

    #[test]
    fn from_persisted_rejects_counter_mismatch() {
        let err = Question::from_persisted(
            QuestionId::new(1),
            "Capital?".into(),
            "Riga".into(),
            Vec::new(),
            QuestionType::Freeform,
            true,
            1,
            2,
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionValidationError::CounterMismatch {
                attempts: 1,
                correct: 2
            }
        );
    }

    #[test]
    fn mode_admits_matching_types() {
        assert!(Mode::Mixed.admits(QuestionType::Freeform));
        assert!(Mode::Mixed.admits(QuestionType::Quiz));
        assert!(Mode::Freeform.admits(QuestionType::Freeform));
        assert!(!Mode::Freeform.admits(QuestionType::Quiz));
        assert!(Mode::Quiz.admits(QuestionType::Quiz));
        assert!(!Mode::Quiz.admits(QuestionType::Freeform));
    }

    #[test]
    fn type_and_mode_parse_from_str() {
        assert_eq!("quiz".parse::<QuestionType>().unwrap(), QuestionType::Quiz);
        assert!("multiple".parse::<QuestionType>().is_err());
        assert_eq!("mixed".parse::<Mode>().unwrap(), Mode::Mixed);
        assert!("all".parse::<Mode>().is_err());
    }
}
