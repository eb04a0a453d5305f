use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Result, bail};
use quiz_core::model::{
    BankError, QuestionDraft, QuestionId, QuestionPatch, QuestionType, StatusReport,
};
use services::{BankService, BankServiceError, StatsReporter};

use crate::idset;

/// Add one question, prompting for a `text;answer;choice|choice;type` line.
pub fn add(db: &Path) -> Result<i32> {
    let mut store = super::open_store(db)?;

    println!("Template: text;answer;choice|choice;type  (leave choices empty for freeform)");
    println!("Examples: Capital of Lithuania?;Vilnius;;freeform");
    println!("          Capital of Latvia?;Riga;Warsaw|Vilnius|Tallinn;quiz");

    let Some(line) = read_line("question: ")? else {
        bail!("no question was entered");
    };
    let draft = parse_template(&line)?;
    let question = store.add(draft)?;

    println!("Added question {}.", question.id());
    super::print_rows(&[StatsReporter::row(store.bank(), question.id())?]);
    Ok(0)
}

/// Update existing question(s) with the same template as `add`. Every field
/// of the targeted question is replaced.
pub fn update(ids: &str, db: &Path) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let mut store = super::open_store(db)?;

    let mut missing = Vec::new();
    for id in ids {
        let Ok(row) = StatsReporter::row(store.bank(), id) else {
            missing.push(id);
            continue;
        };
        super::print_rows(&[row]);

        let Some(line) = read_line("question: ")? else {
            break;
        };
        let draft = parse_template(&line)?;
        store.update(
            id,
            QuestionPatch {
                text: Some(draft.text),
                answer: Some(draft.answer),
                choices: Some(draft.choices),
                kind: Some(draft.kind),
            },
        )?;
        println!("Updated question {id}.");
    }
    finish_batch(missing)
}

/// Remove question(s); unknown ids are reported while the rest proceed.
pub fn remove(ids: &str, db: &Path) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let mut store = super::open_store(db)?;

    let mut missing = Vec::new();
    for id in ids {
        match store.remove(id) {
            Ok(_) => println!("Removed question {id}."),
            Err(BankServiceError::Bank(BankError::NotFound(_))) => missing.push(id),
            Err(err) => return Err(err.into()),
        }
    }
    finish_batch(missing)
}

/// Remove every question, after confirmation.
pub fn remove_all(db: &Path) -> Result<i32> {
    let Some(answer) = read_line("Do you really want to delete all the questions? [y/N]: ")?
    else {
        return Ok(1);
    };
    if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
        println!("Aborted.");
        return Ok(0);
    }

    let mut store = super::open_store(db)?;
    let removed = store.remove_all()?;
    println!("Removed {removed} question(s).");
    Ok(0)
}

/// Enable or disable question(s).
pub fn set_active(ids: &str, db: &Path, active: bool) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let mut store = super::open_store(db)?;
    let report = store.set_active(&ids, active)?;
    print_report(&store, &report)
}

/// Flip each question's active flag independently.
pub fn toggle(ids: &str, db: &Path) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let mut store = super::open_store(db)?;
    let report = store.toggle(&ids)?;
    print_report(&store, &report)
}

/// Zero attempts/correct counters for question(s).
pub fn reset_stats(ids: &str, db: &Path) -> Result<i32> {
    let ids = idset::parse(ids)?;
    let mut store = super::open_store(db)?;
    let report = store.reset_stats(&ids)?;
    print_report(&store, &report)
}

/// Zero attempts/correct counters for every question.
pub fn reset_all_stats(db: &Path) -> Result<i32> {
    let mut store = super::open_store(db)?;
    store.reset_all_stats()?;
    super::print_rows(&StatsReporter::rows(store.bank()));
    Ok(0)
}

fn print_report(store: &BankService, report: &StatusReport) -> Result<i32> {
    let rows: Vec<_> = report
        .changed
        .iter()
        .filter_map(|&id| StatsReporter::row(store.bank(), id).ok())
        .collect();
    super::print_rows(&rows);
    finish_batch(report.missing.clone())
}

fn finish_batch(missing: Vec<QuestionId>) -> Result<i32> {
    if missing.is_empty() {
        return Ok(0);
    }
    let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
    eprintln!("Some ids aren't found in the bank: {}", listed.join(", "));
    Ok(1)
}

/// Parse the four-field authoring template into a draft.
fn parse_template(line: &str) -> Result<QuestionDraft> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() != 4 {
        bail!("expected 4 fields separated by ';': text;answer;choices;type");
    }

    let kind: QuestionType = parts[3].trim().parse()?;
    let choices: Vec<String> = parts[2]
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(QuestionDraft {
        text: parts[0].trim().to_owned(),
        answer: parts[1].trim().to_owned(),
        choices,
        kind,
    })
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}
