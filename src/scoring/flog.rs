//! Scores Ruby source with the `flog` library, run under a Ruby interpreter.
//!
//! The library is driven directly rather than through the `flog` executable,
//! whose text report rounds every score to one decimal.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::{ScoredUnit, Scorer, ScoringError};

/// Reads source from stdin and prints `[{name, score, location}, ...]` in
/// `Flog#totals` order, with full precision scores.
const REPORT_SCRIPT: &str = r#"
flog = Flog.new
flog.flog_ruby($stdin.read, "-")
flog.calculate_total_scores
units = flog.totals.map do |name, score|
  { name: name, score: score, location: flog.method_locations[name] }
end
$stdout.write(JSON.generate(units))
"#;

/// Scorer backed by the `flog` gem.
#[derive(Debug, Clone)]
pub struct FlogCommand {
    ruby: PathBuf,
}

impl FlogCommand {
    /// `ruby` is the interpreter that has the `flog` gem installed.
    pub fn new(ruby: impl Into<PathBuf>) -> Self {
        Self { ruby: ruby.into() }
    }

    pub fn ruby(&self) -> &PathBuf {
        &self.ruby
    }
}

impl Default for FlogCommand {
    fn default() -> Self {
        Self::new("ruby")
    }
}

impl Scorer for FlogCommand {
    fn score(&self, source: &str) -> Result<Vec<ScoredUnit>, ScoringError> {
        let mut child = Command::new(&self.ruby)
            .args(["-rflog", "-rjson", "-e", REPORT_SCRIPT])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ScoringError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A scorer that exits early closes the pipe; its exit status tells the story
            if let Err(e) = stdin.write_all(source.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ScoringError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report = String::from_utf8(output.stdout)?;
        parse_report(&report)
    }
}

#[derive(Debug, Deserialize)]
struct ReportEntry {
    name: String,
    score: f64,
    #[serde(default)]
    location: Option<String>,
}

/// Decode the JSON report printed by the scoring script, keeping its order.
pub fn parse_report(report: &str) -> Result<Vec<ScoredUnit>, ScoringError> {
    let entries: Vec<ReportEntry> = serde_json::from_str(report)?;
    Ok(entries
        .into_iter()
        .map(|entry| ScoredUnit {
            name: entry.name,
            score: entry.score,
            location: entry.location,
        })
        .collect())
}
