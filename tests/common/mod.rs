//! Scripted summarizer shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use daily_digest::{Summarize, SummarizerError, SummaryResponse};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded call: the text sent and the retry budget it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub text: String,
    pub max_retries: u32,
}

/// Replays queued outcomes in order; once the queue is empty every call fails.
#[derive(Default)]
pub struct ScriptedSummarizer {
    outcomes: Mutex<VecDeque<Result<SummaryResponse, SummarizerError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, value: Value) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(SummaryResponse::from(value)));
        self
    }

    pub fn summary(self, text: &str) -> Self {
        self.reply(json!([{ "summary_text": text }]))
    }

    pub fn fail(self) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(exhausted()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn exhausted() -> SummarizerError {
    SummarizerError::RemoteCallExhausted {
        attempts: 2,
        last: Box::new(SummarizerError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "Model is loading".to_string(),
        }),
    }
}

#[async_trait]
impl Summarize for ScriptedSummarizer {
    async fn summarize(
        &self,
        text: &str,
        max_retries: u32,
    ) -> Result<SummaryResponse, SummarizerError> {
        self.calls.lock().unwrap().push(Call {
            text: text.to_string(),
            max_retries,
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }
}

/// `n` distinct short task entries.
pub fn entries(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Completed work item {}", i)).collect()
}
