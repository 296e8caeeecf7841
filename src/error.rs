use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up a run.
///
/// Anything that goes wrong while a scenario is executing is recorded in its
/// [`crate::runner::ScenarioResult`] instead.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid suite file {path}: {reason}")]
    Suite { path: PathBuf, reason: String },

    #[error("failed to load data rows from {path}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, CheckerError>;
