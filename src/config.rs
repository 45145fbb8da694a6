//! Configuration loading and management for the daily digest.
//!
//! Loads settings from `digest.toml` with environment variable overrides for sensitive data.
//! Every section has defaults, so a missing file or an empty one is a valid configuration.

use crate::client::Backoff;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "digest.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required secret: set {0}")]
    MissingSecret(&'static str),
}

/// Remote summarisation endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Base URL of the inference API
    pub base_url: String,
    /// Model identifier appended to the base URL
    pub model: String,
    /// Bearer token (from `HF_API_KEY`)
    pub api_key: Option<String>,
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
    /// Upper bound on summary length, in model tokens
    pub max_length: u32,
    /// Lower bound on summary length, in model tokens
    pub min_length: u32,
    pub do_sample: bool,
    /// Exponential backoff base; attempt `k` waits `base^k` units
    pub backoff_base: u32,
    /// Length of one backoff unit in milliseconds
    pub backoff_unit_ms: u64,
    /// Optional cap on a single backoff wait, in milliseconds
    pub max_backoff_ms: Option<u64>,
}

impl SummarizerConfig {
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            base: self.backoff_base,
            unit: Duration::from_millis(self.backoff_unit_ms),
            cap: self.max_backoff_ms.map(Duration::from_millis),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "facebook/bart-large-cnn".to_string(),
            api_key: None,
            timeout_ms: 120_000,
            max_length: 150,
            min_length: 30,
            do_sample: false,
            backoff_base: 2,
            backoff_unit_ms: 1_000,
            max_backoff_ms: None,
        }
    }
}

/// Thresholds and retry counts for the per-team summarisation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum bullets per team
    pub max_points: usize,
    /// Shortest bullet kept, in characters
    pub min_bullet_chars: usize,
    /// Most unique entries a team may have for a single direct call
    pub direct_max_entries: usize,
    /// Combined entry length, in characters, must stay below this for a direct call
    pub direct_max_chars: usize,
    pub direct_retries: u32,
    /// Entries per chunk when the direct call is skipped or fails
    pub chunk_size: usize,
    pub chunk_retries: u32,
    /// Raw chunk text stands in for a failed chunk summary, cut to this many characters
    pub raw_chunk_chars: usize,
    pub combine_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_points: 5,
            min_bullet_chars: crate::bullets::MIN_BULLET_CHARS,
            direct_max_entries: 6,
            direct_max_chars: 1200,
            direct_retries: 3,
            chunk_size: 10,
            chunk_retries: 2,
            raw_chunk_chars: 1000,
            combine_retries: 2,
        }
    }
}

/// Document store holding the daily reports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Connection string (from `MONGO_URI`)
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
}

impl SourceConfig {
    pub fn uri(&self) -> Result<&str, ConfigError> {
        self.uri
            .as_deref()
            .ok_or(ConfigError::MissingSecret("MONGO_URI"))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: "showtime_reports".to_string(),
            collection: "work_reports".to_string(),
        }
    }
}

/// Spreadsheet template layout and output paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub template: PathBuf,
    pub output: PathBuf,
    /// Directory for the raw CSV export
    pub export_dir: PathBuf,
    /// Cell holding the title with the date placeholder
    pub title_cell: String,
    /// First row of the team table
    pub first_row: u32,
    /// Column holding team names
    pub team_column: String,
    /// Column receiving the summary block
    pub summary_column: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("Tasks template.xlsx"),
            output: PathBuf::from("Daily_Work_Report.xlsx"),
            export_dir: PathBuf::from("."),
            title_cell: "B4".to_string(),
            first_row: 6,
            team_column: "B".to_string(),
            summary_column: "G".to_string(),
        }
    }
}

/// SMTP delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address and SMTP login (from `SMTP_EMAIL`)
    pub sender: Option<String>,
    /// SMTP password (from `SMTP_PASSWORD`)
    pub password: Option<String>,
    pub recipients: Vec<String>,
    pub greeting: String,
    /// Closing lines, one per line of the signature
    pub signature: Vec<String>,
    pub timeout_secs: u64,
}

impl EmailConfig {
    /// Sender address and password, both required to send.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(ConfigError::MissingSecret("SMTP_EMAIL"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError::MissingSecret("SMTP_PASSWORD"))?;
        Ok((sender, password))
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: None,
            password: None,
            recipients: Vec::new(),
            greeting: "Dear team,".to_string(),
            signature: vec!["Regards,".to_string()],
            timeout_secs: 60,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub summarizer: SummarizerConfig,
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub report: ReportConfig,
    pub email: EmailConfig,
}

impl Config {
    /// Load configuration from the default location (digest.toml in cwd or home),
    /// falling back to defaults when neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Override secrets from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("HF_API_KEY") {
            self.summarizer.api_key = Some(key);
        }
        if let Ok(uri) = std::env::var("MONGO_URI") {
            self.source.uri = Some(uri);
        }
        if let Ok(sender) = std::env::var("SMTP_EMAIL") {
            self.email.sender = Some(sender);
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            self.email.password = Some(password);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("digest")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }
}
