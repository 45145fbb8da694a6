//! The daily job: fetch, export, summarise into the workbook, email.

use crate::client::Summarize;
use crate::config::Config;
use crate::export::export_csv;
use crate::notify::Notifier;
use crate::pipeline::TeamSummarizer;
use crate::report::ReportWorkbook;
use crate::source::RecordSource;
use crate::tasks::{reporting_summary, ReportRecord, TeamTasks};
use anyhow::Context;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build the workbook but do not send it
    pub dry_run: bool,
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub records: usize,
    pub teams_summarized: usize,
    pub degraded_teams: usize,
    pub csv: Option<PathBuf>,
    pub workbook: PathBuf,
    pub emailed: bool,
}

/// Fill the template with one summary per team row and save it to the configured output.
pub async fn render_workbook<S: Summarize>(
    config: &Config,
    summarizer: &TeamSummarizer<S>,
    records: &[ReportRecord],
    date: NaiveDate,
) -> anyhow::Result<(PathBuf, usize, usize)> {
    let teams = TeamTasks::from_records(records);
    let mut workbook = ReportWorkbook::open(&config.report)?;
    workbook.stamp_title(date)?;

    let mut summarized = 0;
    let mut degraded = 0;
    for (row, team) in workbook.team_rows()? {
        let Some(tasks) = teams.get(&team) else {
            continue;
        };
        info!(team = %team, tasks = tasks.entries.len(), "Summarizing team");
        let summary = summarizer.summarize(&team, &tasks.entries).await;
        if summary.is_degraded() {
            degraded += 1;
        }
        workbook.write_summary(row, &summary)?;
        summarized += 1;
    }

    workbook.save(&config.report.output)?;
    info!(path = %config.report.output.display(), "Excel report generated");
    Ok((config.report.output.clone(), summarized, degraded))
}

/// Run the whole daily job for `date`.
///
/// Fetch and workbook failures abort the run; export and email failures are
/// logged and the run carries on.
pub async fn run<S: Summarize>(
    config: &Config,
    source: &dyn RecordSource,
    summarizer: &TeamSummarizer<S>,
    date: NaiveDate,
    options: &RunOptions,
) -> anyhow::Result<JobReport> {
    info!(%date, "Starting daily job");

    let records = source
        .fetch(date)
        .await
        .context("failed to fetch report records")?;

    let csv = match export_csv(&records, &config.report.export_dir, date) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "CSV export failed");
            None
        }
    };

    let (workbook, teams_summarized, degraded_teams) =
        render_workbook(config, summarizer, &records, date)
            .await
            .context("Excel generation failed")?;

    let emailed = if options.dry_run {
        info!("Dry run, email not sent");
        false
    } else {
        let rows = reporting_summary(&records);
        match Notifier::new(config.email.clone())
            .send_report(&rows, &workbook, date)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Email send failed");
                false
            }
        }
    };

    info!(teams = teams_summarized, degraded = degraded_teams, "Daily job completed");
    Ok(JobReport {
        records: records.len(),
        teams_summarized,
        degraded_teams,
        csv,
        workbook,
        emailed,
    })
}
