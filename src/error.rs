//! Parley error types

use std::time::Duration;
use thiserror::Error;

/// Parley error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Collaborator unreachable or returned a failure status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Collaborator did not answer within its time budget
    #[error("Timeout: {operation} did not complete within {after:?}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Budget that was exceeded
        after: Duration,
    },

    /// Generator output failed schema validation
    #[error("Malformed generator output: {0}")]
    MalformedOutput(String),

    /// Rejected write that would break a data-model invariant
    #[error("State invariant violation: {0}")]
    StateInvariant(String),

    /// Memory record error
    #[error("Memory error: {0}")]
    Memory(String),

    /// Similarity index error
    #[error("Index error: {0}")]
    Index(String),

    /// Speech synthesis error
    #[error("Speech error: {0}")]
    Speech(String),

    /// Speech capture error
    #[error("Capture error: {0}")]
    Capture(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Whether the failure is recovered locally inside a cycle
    /// (the collaborator is unreachable, slow, or answered garbage).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Timeout { .. } | Error::MalformedOutput(_) | Error::Http(_)
        )
    }
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run a collaborator call under a time budget, mapping expiry to `Error::Timeout`.
pub async fn with_timeout<T, F>(operation: &str, after: Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(operation, after)),
    }
}
