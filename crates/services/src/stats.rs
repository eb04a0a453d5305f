use quiz_core::model::{BankError, Question, QuestionBank, QuestionId, QuestionType};

/// Per-question statistics row, as listed by `stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStatsRow {
    pub id: QuestionId,
    pub text: String,
    pub kind: QuestionType,
    pub active: bool,
    pub attempts: u32,
    pub correct: u32,
    /// `correct / attempts`, `None` before any attempt (rendered "n/a").
    pub accuracy: Option<f64>,
}

impl QuestionStatsRow {
    fn from_question(question: &Question) -> Self {
        Self {
            id: question.id(),
            text: question.text().to_owned(),
            kind: question.kind(),
            active: question.is_active(),
            attempts: question.attempts(),
            correct: question.correct(),
            accuracy: question.accuracy(),
        }
    }
}

/// Aggregate totals over the whole bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankTotals {
    pub total_questions: usize,
    pub total_active: usize,
    pub total_attempts: u64,
    pub total_correct: u64,
}

/// Read-side statistics over the current bank. Pure: derives everything
/// from the store contents and keeps no state of its own.
pub struct StatsReporter;

impl StatsReporter {
    /// One row per question, inactive ones included, ascending id order.
    #[must_use]
    pub fn rows(bank: &QuestionBank) -> Vec<QuestionStatsRow> {
        bank.iter().map(QuestionStatsRow::from_question).collect()
    }

    /// The row for a single question.
    ///
    /// # Errors
    ///
    /// Returns `BankError::NotFound` if the id is absent.
    pub fn row(bank: &QuestionBank, id: QuestionId) -> Result<QuestionStatsRow, BankError> {
        bank.require(id).map(QuestionStatsRow::from_question)
    }

    /// Aggregate totals; all zeros for an empty bank, never an error.
    #[must_use]
    pub fn totals(bank: &QuestionBank) -> BankTotals {
        let mut totals = BankTotals {
            total_questions: bank.len(),
            ..BankTotals::default()
        };
        for question in bank.iter() {
            if question.is_active() {
                totals.total_active += 1;
            }
            totals.total_attempts += u64::from(question.attempts());
            totals.total_correct += u64::from(question.correct());
        }
        totals
    }
}
