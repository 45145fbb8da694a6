//! TeamSummary struct - the per-team output of the summarisation pipeline.

use serde::Serialize;
use std::fmt;

/// The single bullet returned for a team with nothing reported
pub const NO_TASKS: &str = "No tasks reported";

/// Marker placed in front of every bullet when rendered
pub const BULLET_MARKER: &str = "- ";

/// Which stage of the pipeline produced the bullets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    NoTasks,
    /// One call over all entries
    Direct,
    /// Chunk summaries combined by a final call
    Combined,
    /// Raw entries, used when every call failed
    RawFallback,
}

/// Bullet-point summary of one team's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub bullets: Vec<String>,
    pub source: SummarySource,
}

impl TeamSummary {
    pub fn new(bullets: Vec<String>, source: SummarySource) -> Self {
        Self { bullets, source }
    }

    pub fn no_tasks() -> Self {
        Self::new(vec![NO_TASKS.to_string()], SummarySource::NoTasks)
    }

    /// True when the bullets are raw entries rather than a generated summary.
    pub fn is_degraded(&self) -> bool {
        self.source == SummarySource::RawFallback
    }

    /// Lines the rendered block occupies in a cell.
    pub fn line_count(&self) -> usize {
        self.bullets
            .iter()
            .map(|bullet| bullet.lines().count().max(1))
            .sum::<usize>()
            .max(1)
    }
}

impl fmt::Display for TeamSummary {
    /// Bullets prefixed with the marker, one per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bullet) in self.bullets.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{}", BULLET_MARKER, bullet)?;
        }
        Ok(())
    }
}
