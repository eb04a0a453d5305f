//! quiz CLI — terminal front end for the question bank and session engine.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use quiz_core::model::Mode;

mod commands;
mod idset;

fn parse_mode(raw: &str) -> Result<Mode, String> {
    raw.parse().map_err(|err: quiz_core::model::UnknownMode| err.to_string())
}

#[derive(Parser)]
#[command(
    name = "quiz",
    version,
    about = "Personal study tool: manage a question bank, run tests and practice"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test against a limited number of questions; results are saved to file
    Test {
        /// Number of test questions to run
        #[arg(short = 'l', long, default_value_t = 5)]
        limit: u32,

        /// One of: freeform, quiz, mixed
        #[arg(short = 'm', long, default_value = "mixed", value_parser = parse_mode)]
        mode: Mode,

        /// Question bank file
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,

        /// Test results file
        #[arg(long, default_value = "results.txt")]
        results: PathBuf,
    },

    /// Practice an unlimited number of questions until Ctrl-D or Ctrl-C
    Practice {
        /// One of: freeform, quiz, mixed
        #[arg(short = 'm', long, default_value = "mixed", value_parser = parse_mode)]
        mode: Mode,

        /// Question bank file
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Edit existing questions by supplying id(s), or add a new one
    Question {
        #[command(subcommand)]
        action: QuestionAction,
    },

    /// Show statistics of all questions
    Stats {
        /// Question bank file
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },
}

#[derive(Subcommand)]
enum QuestionAction {
    /// Add a new question, prompting for a `text;answer;choice|choice;type` line
    Add {
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Update existing question(s) using the same template as `add`
    Update {
        /// Question id(s): `3`, `1,6,7` or `2-7`
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Remove question(s) from the bank
    Remove {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Remove all questions from the bank
    RemoveAll {
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Change question(s) status to active
    Enable {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Change question(s) status to inactive
    Disable {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Toggle question(s) status between active and inactive
    Toggle {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Reset question(s) statistics
    Reset {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Reset all questions statistics
    ResetAll {
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },

    /// Show question(s) statistics
    Stats {
        ids: String,
        #[arg(long, default_value = "db.csv")]
        db: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Test {
            limit,
            mode,
            db,
            results,
        } => commands::session::run_test(limit, mode, &db, &results),
        Commands::Practice { mode, db } => commands::session::run_practice(mode, &db),
        Commands::Question { action } => match action {
            QuestionAction::Add { db } => commands::question::add(&db),
            QuestionAction::Update { ids, db } => commands::question::update(&ids, &db),
            QuestionAction::Remove { ids, db } => commands::question::remove(&ids, &db),
            QuestionAction::RemoveAll { db } => commands::question::remove_all(&db),
            QuestionAction::Enable { ids, db } => {
                commands::question::set_active(&ids, &db, true)
            }
            QuestionAction::Disable { ids, db } => {
                commands::question::set_active(&ids, &db, false)
            }
            QuestionAction::Toggle { ids, db } => commands::question::toggle(&ids, &db),
            QuestionAction::Reset { ids, db } => commands::question::reset_stats(&ids, &db),
            QuestionAction::ResetAll { db } => commands::question::reset_all_stats(&db),
            QuestionAction::Stats { ids, db } => commands::stats::for_ids(&ids, &db),
        },
        Commands::Stats { db } => commands::stats::for_all(&db),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}
