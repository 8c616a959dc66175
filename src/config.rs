//! Configuration management for the flog language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Log level selection
//! - Client-supplied initialization options

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;

/// Scores at or below this are not reported unless the client says otherwise.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 10.0;

/// Command-line arguments for the flog language server
#[derive(Debug, Parser)]
#[command(name = "flog-lsp")]
#[command(about = "Language server reporting flog complexity scores for Ruby")]
#[command(version)]
pub struct Args {
    /// Run verbosely (same as --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level for the language server
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    /// Ruby interpreter with the flog gem installed
    #[arg(long, default_value = "ruby")]
    pub ruby: PathBuf,
}

/// Process configuration from the command line
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LevelFilter,
    pub ruby_program: PathBuf,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let log_level = if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::from_str(&args.log_level)
                .map_err(|_| anyhow!("unknown log level: {}", args.log_level))?
        };

        Ok(Config {
            log_level,
            ruby_program: args.ruby,
        })
    }
}

/// Session options sent by the client in `initializationOptions`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    #[serde(alias = "score_threshold")]
    pub score_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

impl ServerConfig {
    /// Read options from the client, falling back to defaults when they are
    /// missing or malformed.
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Self {
        match options {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed initialization options: {}", e);
                Self::default()
            }),
        }
    }
}
