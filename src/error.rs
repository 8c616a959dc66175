//! Error types for the flog language server.

use std::path::PathBuf;

use thiserror::Error;

use crate::scoring::ScoringError;

/// Errors raised by the document engine and the request dispatcher.
#[derive(Error, Debug)]
pub enum Error {
    /// An edit referenced a position the document does not have.
    #[error("invalid range at {line}:{character}: {reason}")]
    InvalidRange {
        line: u32,
        character: u32,
        reason: &'static str,
    },

    /// Document content could not be loaded from storage.
    #[error("cannot load {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve document uri: {0}")]
    InvalidUri(String),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("invalid params: {0}")]
    InvalidParams(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
