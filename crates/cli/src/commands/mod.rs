pub mod question;
pub mod session;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use services::{BankService, QuestionStatsRow};
use storage::{BankRepository, CsvBankFile};
use tracing::debug;

/// Open the question store backed by the given bank file. A load failure is
/// fatal for every store-dependent command.
pub fn open_store(db: &Path) -> Result<BankService> {
    debug!(path = %db.display(), "opening question bank");
    let repo = Arc::new(CsvBankFile::new(db)) as Arc<dyn BankRepository>;
    BankService::open(repo)
        .with_context(|| format!("failed to load question bank {}", db.display()))
}

/// Print per-question statistics rows as a plain aligned table.
pub fn print_rows(rows: &[QuestionStatsRow]) {
    if rows.is_empty() {
        println!("No questions are present in the bank.");
        return;
    }

    println!(
        "{:>4}  {:<44}  {:<8}  {:<8}  {:>8}  {:>7}  {:>8}",
        "id", "text", "type", "status", "attempts", "correct", "accuracy"
    );
    for row in rows {
        let status = if row.active { "active" } else { "inactive" };
        let accuracy = row
            .accuracy
            .map_or_else(|| "n/a".to_owned(), |a| format!("{:.0}%", a * 100.0));
        println!(
            "{:>4}  {:<44}  {:<8}  {:<8}  {:>8}  {:>7}  {:>8}",
            row.id,
            truncated(&row.text, 44),
            row.kind,
            status,
            row.attempts,
            row.correct,
            accuracy
        );
    }
}

fn truncated(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut shortened: String = text.chars().take(max.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
