//! Complexity scoring
//!
//! The scorer is an external collaborator: it takes Ruby source and reports a
//! score per method. The language server only consumes its output.

pub mod flog;

pub use flog::FlogCommand;

use std::process::ExitStatus;
use std::string::FromUtf8Error;

use thiserror::Error;

/// One scored method or block, as reported by the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUnit {
    pub name: String,
    pub score: f64,
    /// `"<file>:<startLine>-<endLine>"`, when the scorer knows it.
    pub location: Option<String>,
}

impl ScoredUnit {
    pub fn new(name: impl Into<String>, score: f64, location: Option<&str>) -> Self {
        Self {
            name: name.into(),
            score,
            location: location.map(str::to_string),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("failed to spawn scorer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("scorer exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("scorer produced invalid output: {0}")]
    Output(#[from] FromUtf8Error),

    #[error("scorer report is not valid JSON: {0}")]
    Report(#[from] serde_json::Error),

    #[error("I/O error talking to scorer: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes complexity scores for a whole source file.
///
/// Units are returned in the scorer's own order.
pub trait Scorer: Send {
    fn score(&self, source: &str) -> Result<Vec<ScoredUnit>, ScoringError>;
}

impl<F> Scorer for F
where
    F: Fn(&str) -> Result<Vec<ScoredUnit>, ScoringError> + Send,
{
    fn score(&self, source: &str) -> Result<Vec<ScoredUnit>, ScoringError> {
        self(source)
    }
}
