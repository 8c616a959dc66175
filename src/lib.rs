//! Flog Language Server
//!
//! A Language Server Protocol implementation reporting flog complexity
//! scores for Ruby files.
//!
//! This library provides:
//! - Incremental document synchronization
//! - Threshold-filtered complexity diagnostics
//! - LSP protocol implementation
//! - Configuration management

pub mod config;
pub mod core;
pub mod error;
pub mod lsp;
pub mod scoring;

// Re-exports for clean public API
pub use config::{Config, ServerConfig};
pub use crate::core::{diagnose, DocumentManager, Edit, Finding};
pub use error::{Error, Result};
pub use scoring::{FlogCommand, ScoredUnit, Scorer};
