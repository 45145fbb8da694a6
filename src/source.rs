//! Where the day's report records come from.
//!
//! The production source is a MongoDB collection; a JSON file of records can
//! stand in for it when running by hand.

use crate::config::{ConfigError, SourceConfig};
use crate::tasks::ReportRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Client;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Date format used by the `date` field of every record
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("failed to read records file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse records: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All records reported for `date`.
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<ReportRecord>, SourceError>;
}

/// Reads the day's documents from a MongoDB collection.
pub struct MongoSource {
    config: SourceConfig,
}

impl MongoSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecordSource for MongoSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<ReportRecord>, SourceError> {
        let client = Client::with_uri_str(self.config.uri()?).await?;
        let collection = client
            .database(&self.config.database)
            .collection::<ReportRecord>(&self.config.collection);

        let day = date.format(DATE_FORMAT).to_string();
        let records: Vec<ReportRecord> = collection
            .find(doc! { "date": day.as_str() })
            .await?
            .try_collect()
            .await?;

        info!(count = records.len(), date = %day, "Fetched records");
        Ok(records)
    }
}

/// Reads records from a JSON array on disk.
///
/// Records dated another day are skipped; undated records are kept.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<ReportRecord>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<ReportRecord> = serde_json::from_str(&content)?;

        let day = date.format(DATE_FORMAT).to_string();
        let records: Vec<ReportRecord> = records
            .into_iter()
            .filter(|record| record.date.is_empty() || record.date == day)
            .collect();

        info!(count = records.len(), date = %day, path = %self.path.display(), "Loaded records");
        Ok(records)
    }
}
