//! Application error types.
//!
//! Defines the `AppError` enum for all error conditions raised by the
//! history provider and the revision model.
//!
//! Policy notes:
//! - An empty change log is not an error; it leaves the model with an
//!   empty revision list and no selection.
//! - Out-of-range revision indices are silently ignored by the model,
//!   so they never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The external history provider could not be run or exited non-zero.
    #[error("provider command failed: {command}: {detail}")]
    Provider { command: String, detail: String },

    /// Provider output that does not match the expected shape.
    #[error("malformed provider output: {0}")]
    MalformedOutput(String),

    /// No revision in the loaded history matches the given identifier.
    #[error("no revision matching identifier: {0}")]
    RevisionNotFound(String),

    /// The working directory is not inside a repository.
    #[error("not inside a repository: {0}")]
    NotInRepository(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
