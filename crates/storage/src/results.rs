use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use tracing::debug;

use quiz_core::model::SessionOutcome;

use crate::repository::{ResultsLog, StorageError};

/// Render one completed test session as a single results-file line.
///
/// Layout: finish timestamp, mode, percent with correct/total ratio,
/// duration in whole seconds, then the graded entries in order as
/// `<id>+` / `<id>-`.
#[must_use]
pub fn format_line(outcome: &SessionOutcome) -> String {
    let total = outcome.total();
    let correct = outcome.correct_count();
    let percent = outcome.score().map_or(0.0, |score| score * 100.0);
    let entries = outcome
        .entries()
        .iter()
        .map(|entry| {
            let mark = if entry.was_correct { '+' } else { '-' };
            format!("{}{mark}", entry.question_id)
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{}\t{}\t{percent:.0}% ({correct}/{total}) correct\ttook {}s\t[{entries}]",
        outcome
            .finished_at()
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        outcome.mode(),
        outcome.duration().num_seconds(),
    )
}

/// Append-or-create results file, one line per completed test session.
#[derive(Debug, Clone)]
pub struct FileResultsLog {
    path: PathBuf,
}

impl FileResultsLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsLog for FileResultsLog {
    fn append(&self, outcome: &SessionOutcome) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(outcome))?;
        debug!(path = %self.path.display(), "test result appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Mode, QuestionId, SessionEntry};
    use quiz_core::time::fixed_now;

    #[test]
    fn line_carries_score_duration_and_graded_entries() {
        let outcome = SessionOutcome::new(
            Mode::Mixed,
            fixed_now(),
            fixed_now() + Duration::seconds(14),
            vec![
                SessionEntry {
                    question_id: QuestionId::new(1),
                    response: "Vilnius".into(),
                    was_correct: true,
                },
                SessionEntry {
                    question_id: QuestionId::new(4),
                    response: "Warsaw".into(),
                    was_correct: false,
                },
            ],
        )
        .unwrap();

        let line = format_line(&outcome);
        assert!(line.contains("50% (1/2) correct"), "line: {line}");
        assert!(line.contains("took 14s"), "line: {line}");
        assert!(line.ends_with("[1+ 4-]"), "line: {line}");
        assert!(line.contains("mixed"), "line: {line}");
    }

    #[test]
    fn empty_outcome_formats_without_a_score_division() {
        let outcome =
            SessionOutcome::new(Mode::Quiz, fixed_now(), fixed_now(), Vec::new()).unwrap();
        let line = format_line(&outcome);
        assert!(line.contains("0% (0/0) correct"), "line: {line}");
        assert!(line.ends_with("[]"), "line: {line}");
    }
}
