// execution/errors.rs

use thiserror::Error;

/// Failure of a single amplification request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Execution rejected for {symbol}: {reason}")]
    Rejected { symbol: String, reason: String },

    #[error("Execution timed out for {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Position source could not deliver a position set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Position provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        ExecutionError::Transport(err.to_string())
    }
}
