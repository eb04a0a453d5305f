use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use quiz_core::Clock;
use quiz_core::model::Mode;
use services::{BankService, Sampler, SessionEngine, SessionError, SessionKind};
use storage::{FileResultsLog, ResultsLog};

/// Run a bounded scored test; the outcome is appended to the results file.
pub fn run_test(limit: u32, mode: Mode, db: &Path, results: &Path) -> Result<i32> {
    let mut store = super::open_store(db)?;
    let engine = match SessionEngine::start(
        SessionKind::Test { limit },
        mode,
        &store,
        Sampler::from_entropy(),
        Clock::default_clock().now(),
    ) {
        Ok(engine) => engine,
        Err(err) => return Ok(report_start_error(&err)),
    };

    let input = spawn_input_source()?;
    let results_log = FileResultsLog::new(results);
    run_loop(&mut store, engine, Some(&results_log), &input)
}

/// Practice until the user cancels with Ctrl-D or Ctrl-C.
pub fn run_practice(mode: Mode, db: &Path) -> Result<i32> {
    let mut store = super::open_store(db)?;
    let engine = match SessionEngine::start(
        SessionKind::Practice,
        mode,
        &store,
        Sampler::from_entropy(),
        Clock::default_clock().now(),
    ) {
        Ok(engine) => engine,
        Err(err) => return Ok(report_start_error(&err)),
    };

    let input = spawn_input_source()?;
    run_loop(&mut store, engine, None, &input)
}

fn report_start_error(err: &SessionError) -> i32 {
    match err {
        SessionError::EmptyPool => {
            eprintln!("No active questions match the requested mode.");
        }
        SessionError::EmptyRequest => {
            eprintln!("A test needs at least one question; --limit 0 asks for none.");
        }
        other => eprintln!("error: {other}"),
    }
    1
}

/// Merge stdin lines and interrupt notifications into one stream.
///
/// `Some(line)` is a submitted answer; `None` ends the session: end of
/// input (Ctrl-D), a read error, or Ctrl-C. Routing SIGINT through the
/// same channel lets an interrupt unwind through the ordinary
/// cancel-and-finish path instead of killing the process mid-session.
fn spawn_input_source() -> Result<Receiver<Option<String>>> {
    let (tx, rx) = mpsc::channel();

    let interrupt_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(None);
    })
    .context("failed to install the interrupt handler")?;

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Some(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(None);
    });

    Ok(rx)
}

fn run_loop(
    store: &mut BankService,
    mut engine: SessionEngine,
    results: Option<&dyn ResultsLog>,
    input: &Receiver<Option<String>>,
) -> Result<i32> {
    loop {
        let Some(prompt) = engine.next_prompt(store) else {
            break;
        };

        println!("{}. {}", prompt.number, prompt.text);
        if let Some(options) = &prompt.options {
            for (index, option) in options.iter().enumerate() {
                println!("\t{}. {option}", letter(index));
            }
        }

        let Some(raw) = read_answer(input, prompt.options.as_deref())? else {
            // end of input or interrupt: normal cancellation, the open
            // prompt is discarded
            engine.cancel();
            println!();
            break;
        };

        let graded = engine.submit(store, &raw)?;
        if graded.was_correct {
            println!("Success! Your answer is correct!");
        } else {
            println!("You're wrong. Right answer: {}", graded.expected);
        }
        println!("{}", "-".repeat(80));
    }

    let close = engine.finish(store, results, Clock::default_clock().now())?;

    match close.outcome.score() {
        Some(score) => println!(
            "{:.0}% ({}/{}) correct answers. Took {} sec.",
            score * 100.0,
            close.outcome.correct_count(),
            close.outcome.total(),
            close.outcome.duration().num_seconds()
        ),
        None => println!("No questions were answered."),
    }

    if let Some(err) = close.save_error {
        eprintln!("warning: session results could not be fully saved: {err}");
        return Ok(1);
    }
    Ok(0)
}

fn letter(index: usize) -> char {
    // option lists are small; past Z the letters would stop being unique
    char::from(b'A' + u8::try_from(index % 26).unwrap_or(0))
}

/// Block for one answer. Freeform prompts take any non-empty line; quiz
/// prompts take a choice letter, which is mapped back to the option text.
/// `None` means the session was cancelled (end of input or Ctrl-C).
fn read_answer(
    input: &Receiver<Option<String>>,
    options: Option<&[String]>,
) -> Result<Option<String>> {
    loop {
        match options {
            Some(_) => print!("Choose letter: "),
            None => print!("Your answer: "),
        }
        io::stdout().flush()?;

        let Ok(Some(line)) = input.recv() else {
            return Ok(None);
        };
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }

        let Some(options) = options else {
            return Ok(Some(entry.to_owned()));
        };

        let upper = entry.to_uppercase();
        let mut chars = upper.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            if first.is_ascii_uppercase() {
                let index = (first as u8 - b'A') as usize;
                if let Some(option) = options.get(index) {
                    return Ok(Some(option.clone()));
                }
            }
        }
        println!("Pick one of the listed letters.");
    }
}
