//! Raw CSV export of the day's records.

use crate::tasks::ReportRecord;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const HEADER: [&str; 5] = ["date", "department", "team", "employee_name", "tasks"];

/// Joins a record's task texts into one CSV field
const TASK_SEPARATOR: &str = " | ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name of the export for `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("mongo_export_{}.csv", date.format("%Y%m%d"))
}

/// Write `records` to a dated CSV file in `dir`. Nothing is written for an empty day.
pub fn export_csv(
    records: &[ReportRecord],
    dir: &Path,
    date: NaiveDate,
) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(date));
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(HEADER)?;
    for record in records {
        let tasks: Vec<String> = record
            .tasks()
            .iter()
            .map(|task| task.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        writer.write_record([
            record.date.as_str(),
            record.department.as_deref().unwrap_or_default(),
            record.team.as_deref().unwrap_or_default(),
            record.employee_name.as_str(),
            tasks.join(TASK_SEPARATOR).as_str(),
        ])?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Exported records");
    Ok(Some(path))
}
