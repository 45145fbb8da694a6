//! Per-team summarisation pipeline.
//!
//! One team's entries move through a fixed sequence of stages:
//!
//! 1. **Direct** - small inputs go to the summariser in one call.
//! 2. **Chunked** - otherwise (or when the direct call yields nothing) the
//!    entries are summarised in fixed-size chunks; a failed chunk keeps its
//!    raw text.
//! 3. **Combine** - the chunk summaries are summarised once more.
//! 4. **Fallback** - the first entries are used verbatim.
//!
//! Network failures are logged and move the team to the next stage, so every
//! non-empty input ends with at least one bullet.

use crate::bullets::BulletSplitter;
use crate::client::Summarize;
use crate::config::PipelineConfig;
use crate::summary::{SummarySource, TeamSummary};
use crate::tasks::dedup;
use tracing::{debug, info, warn};

/// Joins entries into one text for the summariser
pub const ENTRY_SEPARATOR: &str = " . ";

/// Joins chunk summaries for the combine pass
pub const CHUNK_SEPARATOR: &str = " ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Chunked,
    /// Carries one summary (or raw stand-in) per chunk
    Combine(Vec<String>),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Next(Stage),
    Done(TeamSummary),
}

/// Whether the deduplicated entries are small enough for a single call.
pub fn is_direct_eligible(entries: &[String], config: &PipelineConfig) -> bool {
    let total_chars: usize = entries.iter().map(|e| e.chars().count()).sum();
    entries.len() <= config.direct_max_entries && total_chars < config.direct_max_chars
}

/// Where a team with these entries starts.
pub fn first_stage(entries: &[String], config: &PipelineConfig) -> Stage {
    if is_direct_eligible(entries, config) {
        Stage::Direct
    } else {
        Stage::Chunked
    }
}

/// Transition out of a summarising stage given its bullets, if any.
pub fn after_attempt(stage: &Stage, bullets: Option<Vec<String>>) -> Step {
    match (stage, bullets) {
        (Stage::Direct, Some(bullets)) => {
            Step::Done(TeamSummary::new(bullets, SummarySource::Direct))
        }
        (Stage::Direct, None) => Step::Next(Stage::Chunked),
        (Stage::Combine(_), Some(bullets)) => {
            Step::Done(TeamSummary::new(bullets, SummarySource::Combined))
        }
        _ => Step::Next(Stage::Fallback),
    }
}

/// The first `max_points` entries, verbatim.
pub fn fallback_points(entries: &[String], max_points: usize) -> Vec<String> {
    entries.iter().take(max_points).cloned().collect()
}

/// Stand-in for a chunk whose summary failed: its joined text, cut to `limit` characters.
pub fn raw_chunk_text(chunk: &[String], limit: usize) -> String {
    chunk.join(ENTRY_SEPARATOR).chars().take(limit).collect()
}

/// Runs the stage sequence for one team at a time.
pub struct TeamSummarizer<S> {
    client: S,
    config: PipelineConfig,
    splitter: BulletSplitter,
}

impl<S: Summarize> TeamSummarizer<S> {
    pub fn new(client: S, mut config: PipelineConfig) -> Self {
        config.max_points = config.max_points.max(1);
        config.chunk_size = config.chunk_size.max(1);
        let splitter =
            BulletSplitter::new(config.max_points).with_min_chars(config.min_bullet_chars);
        Self {
            client,
            config,
            splitter,
        }
    }

    pub fn client(&self) -> &S {
        &self.client
    }

    /// Summarise one team's task entries. Never fails.
    pub async fn summarize<I, T>(&self, team: &str, tasks: I) -> TeamSummary
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let entries = dedup(tasks);
        if entries.is_empty() {
            return TeamSummary::no_tasks();
        }

        let mut stage = first_stage(&entries, &self.config);
        loop {
            debug!(team, stage = stage_name(&stage), "Entering stage");
            stage = match self.advance(team, stage, &entries).await {
                Step::Done(summary) => {
                    info!(
                        team,
                        bullets = summary.bullets.len(),
                        source = ?summary.source,
                        "Team summarised"
                    );
                    return summary;
                }
                Step::Next(next) => next,
            };
        }
    }

    async fn advance(&self, team: &str, stage: Stage, entries: &[String]) -> Step {
        match stage {
            Stage::Direct => {
                let text = entries.join(ENTRY_SEPARATOR);
                let bullets = self
                    .attempt(team, "direct", &text, self.config.direct_retries)
                    .await;
                after_attempt(&stage, bullets)
            }
            Stage::Chunked => {
                let parts = self.summarize_chunks(team, entries).await;
                Step::Next(Stage::Combine(parts))
            }
            Stage::Combine(ref parts) => {
                let text = parts.join(CHUNK_SEPARATOR);
                let bullets = self
                    .attempt(team, "combine", &text, self.config.combine_retries)
                    .await;
                after_attempt(&stage, bullets)
            }
            Stage::Fallback => {
                warn!(team, "All summarisation stages failed, using raw entries");
                Step::Done(TeamSummary::new(
                    fallback_points(entries, self.config.max_points),
                    SummarySource::RawFallback,
                ))
            }
        }
    }

    /// One summary per chunk, substituting raw text for chunks that fail.
    async fn summarize_chunks(&self, team: &str, entries: &[String]) -> Vec<String> {
        let mut parts = Vec::new();
        for (index, chunk) in entries.chunks(self.config.chunk_size).enumerate() {
            let text = chunk.join(ENTRY_SEPARATOR);
            let summary = match self.client.summarize(&text, self.config.chunk_retries).await {
                Ok(response) => response.extract().map(str::to_string),
                Err(e) => {
                    warn!(team, chunk = index, error = %e, "Chunk summarisation failed");
                    None
                }
            };
            let summary = summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| raw_chunk_text(chunk, self.config.raw_chunk_chars));
            parts.push(summary);
        }
        parts
    }

    /// Call the summariser and split its text; `None` when nothing usable comes back.
    async fn attempt(
        &self,
        team: &str,
        stage: &'static str,
        text: &str,
        retries: u32,
    ) -> Option<Vec<String>> {
        match self.client.summarize(text, retries).await {
            Ok(response) => {
                let bullets = response
                    .extract()
                    .map(|summary| self.splitter.split(summary))
                    .unwrap_or_default();
                if bullets.is_empty() {
                    warn!(team, stage, "Summarizer returned no usable text");
                    None
                } else {
                    Some(bullets)
                }
            }
            Err(e) => {
                warn!(team, stage, error = %e, "Summarisation failed");
                None
            }
        }
    }
}

fn stage_name(stage: &Stage) -> &'static str {
    match stage {
        Stage::Direct => "direct",
        Stage::Chunked => "chunked",
        Stage::Combine(_) => "combine",
        Stage::Fallback => "fallback",
    }
}
