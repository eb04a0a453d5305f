#![forbid(unsafe_code)]

pub mod csv_file;
pub mod repository;
pub mod results;

pub use csv_file::CsvBankFile;
pub use repository::{
    BankRepository, InMemoryRepository, MemoryResultsLog, ResultsLog, StorageError,
};
pub use results::FileResultsLog;
