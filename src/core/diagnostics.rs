//! Diagnostic Provider
//!
//! Turns scorer output into findings: one per unit scoring above the
//! threshold, anchored at the unit's first line.

use crate::scoring::{ScoredUnit, Scorer};

/// A unit whose complexity exceeds the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub label: String,
    /// 1-based line where the unit starts.
    pub line: u32,
    pub score: f64,
}

impl Finding {
    pub fn message(&self) -> String {
        format!("{} has a flog score of {}", self.label, format_score(self.score))
    }
}

/// Score `content` and keep the units above `threshold`, in scorer order.
///
/// Scorer failures are logged and reported as no findings.
pub fn diagnose(scorer: &dyn Scorer, content: &str, threshold: f64) -> Vec<Finding> {
    let units = match scorer.score(content) {
        Ok(units) => units,
        Err(e) => {
            log::error!("Error calculating flog: {}", e);
            return Vec::new();
        }
    };

    units
        .into_iter()
        .filter(|unit| unit.score > threshold)
        .filter_map(to_finding)
        .collect()
}

fn to_finding(unit: ScoredUnit) -> Option<Finding> {
    let Some(location) = unit.location.as_deref() else {
        log::debug!("No location for {}", unit.name);
        return None;
    };
    let Some(line) = start_line(location) else {
        log::debug!("Unparseable location for {}: {}", unit.name, location);
        return None;
    };

    Some(Finding {
        label: unit.name,
        line,
        score: unit.score,
    })
}

/// Start line of a `"<file>:<start>-<end>"` location.
pub fn start_line(location: &str) -> Option<u32> {
    let (_file, lines) = location.rsplit_once(':')?;
    let start = match lines.split_once('-') {
        Some((start, _end)) => start,
        None => lines,
    };
    start.trim().parse().ok()
}

/// Round to two decimals, keeping one decimal on whole numbers (`12.0`).
fn format_score(score: f64) -> String {
    let rounded = (score * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}
