//! Remote summarisation client.
//!
//! Uses reqwest to post text to an inference endpoint, retrying failed
//! attempts with exponential backoff.

use crate::config::SummarizerConfig;
use crate::response::SummaryResponse;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("daily-digest/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in a status error
const MAX_ERROR_BODY: usize = 200;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("summarizer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("summarizer returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("summarizer gave up after {attempts} attempt(s): {last}")]
    RemoteCallExhausted {
        attempts: u32,
        #[source]
        last: Box<SummarizerError>,
    },
}

/// Anything that can turn a block of text into a summary response.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Summarise `text`, making at most `max_retries` attempts.
    async fn summarize(
        &self,
        text: &str,
        max_retries: u32,
    ) -> Result<SummaryResponse, SummarizerError>;
}

/// Exponential backoff schedule: failed attempt `k` waits `base^k` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: u32,
    pub unit: Duration,
    pub cap: Option<Duration>,
}

impl Backoff {
    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.unit.saturating_mul(self.base.saturating_pow(attempt));
        match self.cap {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: 2,
            unit: Duration::from_secs(1),
            cap: None,
        }
    }
}

/// Run `call` until it succeeds or `max_retries` attempts have failed.
///
/// `call` receives the 1-based attempt number. A `max_retries` of zero still
/// makes one attempt.
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    backoff: &Backoff,
    mut call: F,
) -> Result<T, SummarizerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SummarizerError>>,
{
    let max_retries = max_retries.max(1);
    let mut attempt = 1;
    loop {
        match call(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, max_retries, error = %e, "Summarizer attempt failed");
                if attempt >= max_retries {
                    return Err(SummarizerError::RemoteCallExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                let wait = backoff.delay(attempt);
                info!(wait_ms = wait.as_millis() as u64, "Retrying summarizer call");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerationParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
}

/// Summariser backed by an HTTP inference endpoint.
pub struct HttpSummarizer {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    parameters: GenerationParameters,
    backoff: Backoff,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            parameters: GenerationParameters {
                max_length: config.max_length,
                min_length: config.min_length,
                do_sample: config.do_sample,
            },
            backoff: config.backoff(),
        })
    }

    /// One request, no retries. Timeouts, transport errors, non-2xx statuses
    /// and non-JSON bodies are all errors.
    async fn post_once(&self, text: &str) -> Result<SummaryResponse, SummarizerError> {
        let mut request = self.http.post(&self.endpoint).json(&SummarizeRequest {
            inputs: text,
            parameters: &self.parameters,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status,
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        Ok(response.json::<SummaryResponse>().await?)
    }
}

#[async_trait]
impl Summarize for HttpSummarizer {
    async fn summarize(
        &self,
        text: &str,
        max_retries: u32,
    ) -> Result<SummaryResponse, SummarizerError> {
        with_retries(max_retries, &self.backoff, |_| self.post_once(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn unavailable() -> SummarizerError {
        SummarizerError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "Model is loading".to_string(),
        }
    }

    fn test_config(server: &MockServer) -> SummarizerConfig {
        SummarizerConfig {
            base_url: format!("{}/models", server.uri()),
            model: "bart".to_string(),
            api_key: Some("secret".to_string()),
            timeout_ms: 2_000,
            backoff_unit_ms: 1,
            ..SummarizerConfig::default()
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(5), Duration::from_secs(32));

        let capped = Backoff {
            cap: Some(Duration::from_secs(10)),
            ..backoff
        };
        assert_eq!(capped.delay(3), Duration::from_secs(8));
        assert_eq!(capped.delay(4), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_third_attempt_after_exponential_waits() {
        let backoff = Backoff::default();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = with_retries(3, &backoff, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(unavailable())
                } else {
                    Ok("summary")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(7), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion() {
        let backoff = Backoff::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), _> =
            with_retries(3, &backoff, |_| async { Err(unavailable()) }).await;

        match result {
            Err(SummarizerError::RemoteCallExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, SummarizerError::Status { .. }));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        // No wait after the final attempt.
        assert!(started.elapsed() < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(0, &Backoff::default(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_summarize_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/bart"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "inputs": "Fixed the build . Wrote docs",
                "parameters": {"max_length": 150, "min_length": 30, "do_sample": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"summary_text": "The team fixed the build."}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpSummarizer::new(&test_config(&server)).unwrap();
        let response = client
            .summarize("Fixed the build . Wrote docs", 3)
            .await
            .unwrap();

        assert_eq!(response.extract(), Some("The team fixed the build."));
    }

    #[tokio::test]
    async fn test_http_summarize_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Model is loading"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated_text": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpSummarizer::new(&test_config(&server)).unwrap();
        let response = client.summarize("text", 3).await.unwrap();
        assert_eq!(response.extract(), Some("ok"));
    }

    #[tokio::test]
    async fn test_http_summarize_exhausts_on_persistent_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpSummarizer::new(&test_config(&server)).unwrap();
        let err = client.summarize("text", 2).await.unwrap_err();

        match err {
            SummarizerError::RemoteCallExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                match *last {
                    SummarizerError::Status { status, ref body } => {
                        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                        assert_eq!(body, "boom");
                    }
                    ref other => panic!("unexpected last error {:?}", other),
                }
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_summarize_timeout_counts_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = SummarizerConfig {
            timeout_ms: 50,
            ..test_config(&server)
        };
        let client = HttpSummarizer::new(&config).unwrap();
        let err = client.summarize("text", 2).await.unwrap_err();
        assert!(matches!(
            err,
            SummarizerError::RemoteCallExhausted { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_http_summarize_unrecognized_body_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"warnings": []})))
            .mount(&server)
            .await;

        let client = HttpSummarizer::new(&test_config(&server)).unwrap();
        let response = client.summarize("text", 1).await.unwrap();
        assert_eq!(response.extract(), None);
    }
}
