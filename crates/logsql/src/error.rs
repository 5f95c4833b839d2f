//! Error types for logsql

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Load errors
    #[error("File doesn't exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("File is not valid UTF-8 text: {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid separator {input:?}: {source}")]
    InvalidSeparator {
        input: String,
        source: regex::Error,
    },

    // Usage errors
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Unknown command: {0} (type .help for the command list)")]
    UnknownCommand(String),

    // Query errors
    #[error("{0}")]
    Sql(#[from] rusqlite::Error),

    // Output and terminal errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl Error {
    /// True for errors raised while reading or parsing the input file.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_)
                | Error::EmptyFile(_)
                | Error::Decode { .. }
                | Error::Io(_)
                | Error::Csv(_)
                | Error::InvalidSeparator { .. }
        )
    }

    /// True for errors reported by the SQL engine.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Sql(_))
    }

    /// True for malformed dot-command input.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::Usage(_) | Error::UnknownCommand(_))
    }
}
