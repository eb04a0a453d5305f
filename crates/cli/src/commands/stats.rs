use std::path::Path;

use anyhow::Result;
use services::StatsReporter;

use crate::idset;

/// Show the full bank with a totals line underneath.
pub fn for_all(db: &Path) -> Result<i32> {
    let store = super::open_store(db)?;
    super::print_rows(&StatsReporter::rows(store.bank()));

    let totals = StatsReporter::totals(store.bank());
    if totals.total_questions > 0 {
        println!();
        println!(
            "{} question(s), {} active; {} attempt(s), {} correct",
            totals.total_questions,
            totals.total_active,
            totals.total_attempts,
            totals.total_correct
        );
    }
    Ok(0)
}

/// Show only the requested ids; unknown ids are reported on stderr.
pub fn for_ids(ids: &str, db: &Path) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let store = super::open_store(db)?;

    let mut rows = Vec::new();
    let mut missing = Vec::new();
    for id in ids {
        match StatsReporter::row(store.bank(), id) {
            Ok(row) => rows.push(row),
            Err(_) => missing.push(id),
        }
    }
    super::print_rows(&rows);

    if missing.is_empty() {
        return Ok(0);
    }
    let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
    eprintln!("Some ids aren't found in the bank: {}", listed.join(", "));
    Ok(1)
}
