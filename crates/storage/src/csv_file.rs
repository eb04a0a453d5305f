use std::collections::HashSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use quiz_core::model::{Question, QuestionBank, QuestionId, QuestionType};

use crate::repository::{BankRepository, StorageError};

/// Separator between entries of the persisted `choices` column. Commas stay
/// usable inside individual choice texts; `|` itself is rejected by
/// question validation, so the join is lossless.
const CHOICE_SEPARATOR: char = '|';

//
// ─── PERSISTED ROW ─────────────────────────────────────────────────────────────
//

/// Persisted shape of one question, one CSV row per record.
///
/// Mirrors the domain `Question` so the file layout never leaks into the
/// domain layer.
#[derive(Debug, Serialize, Deserialize)]
struct BankRow {
    id: u64,
    text: String,
    answer: String,
    choices: String,
    #[serde(rename = "type")]
    kind: QuestionType,
    active: bool,
    attempts: u32,
    correct: u32,
}

impl BankRow {
    fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().value(),
            text: question.text().to_owned(),
            answer: question.answer().to_owned(),
            choices: question.choices().join(&CHOICE_SEPARATOR.to_string()),
            kind: question.kind(),
            active: question.is_active(),
            attempts: question.attempts(),
            correct: question.correct(),
        }
    }

    fn into_question(self) -> Result<Question, quiz_core::model::QuestionValidationError> {
        let choices: Vec<String> = self
            .choices
            .split(CHOICE_SEPARATOR)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect();

        Question::from_persisted(
            QuestionId::new(self.id),
            self.text,
            self.answer,
            choices,
            self.kind,
            self.active,
            self.attempts,
            self.correct,
        )
    }
}

//
// ─── FLAT-FILE BANK ────────────────────────────────────────────────────────────
//

/// Flat-file implementation of `BankRepository`: a headered CSV with one row
/// per question (`id,text,answer,choices,type,active,attempts,correct`).
#[derive(Debug, Clone)]
pub struct CsvBankFile {
    path: PathBuf,
}

impl CsvBankFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BankRepository for CsvBankFile {
    fn load(&self) -> Result<QuestionBank, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "bank file absent, starting empty");
                return Ok(QuestionBank::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = csv::Reader::from_reader(file);
        let mut seen = HashSet::new();
        let mut questions = Vec::new();
        for (index, row) in reader.deserialize::<BankRow>().enumerate() {
            // header occupies line 1
            let line = index + 2;
            let row = row.map_err(|err| StorageError::Corrupt {
                line,
                message: err.to_string(),
            })?;
            if !seen.insert(row.id) {
                return Err(StorageError::Corrupt {
                    line,
                    message: format!("duplicate question id {}", row.id),
                });
            }
            let question = row.into_question().map_err(|err| StorageError::Corrupt {
                line,
                message: err.to_string(),
            })?;
            questions.push(question);
        }

        debug!(path = %self.path.display(), count = questions.len(), "bank loaded");
        QuestionBank::from_persisted(questions).map_err(|err| StorageError::Corrupt {
            line: 0,
            message: err.to_string(),
        })
    }

    fn save(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file());
            for question in bank.iter() {
                writer.serialize(BankRow::from_question(question))?;
            }
            writer.flush().map_err(StorageError::Io)?;
        }

        // rename over the live file only once the temp copy is complete
        tmp.persist(&self.path)
            .map_err(|err| StorageError::Io(err.error))?;
        debug!(path = %self.path.display(), count = bank.len(), "bank saved");
        Ok(())
    }
}
