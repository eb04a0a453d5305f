#![forbid(unsafe_code)]

pub mod bank_service;
pub mod error;
pub mod sampler;
pub mod session;
pub mod stats;

pub use quiz_core::Clock;

pub use bank_service::BankService;
pub use error::{BankServiceError, SessionError};
pub use sampler::Sampler;
pub use session::{GradedAnswer, Prompt, SessionClose, SessionEngine, SessionKind};
pub use stats::{BankTotals, QuestionStatsRow, StatsReporter};
