//! Daily Digest CLI - summarise the day's team reports
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use daily_digest::job::{self, RunOptions};
use daily_digest::source::{JsonFileSource, MongoSource, RecordSource};
use daily_digest::tasks::{reporting_summary, TeamTasks};
use daily_digest::{notify, Config, HttpSummarizer, TeamSummarizer};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(author, version, about = "Summarise daily team task reports into a spreadsheet", long_about = None)]
struct Cli {
    /// Config file (defaults to digest.toml in cwd or ~/.config/digest)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily job: fetch, export, render and email
    Run {
        /// Report day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Read records from a JSON file instead of the database
        #[arg(long)]
        input: Option<PathBuf>,
        /// Build the workbook without sending email
        #[arg(long)]
        dry_run: bool,
    },
    /// Summarise each team in a JSON records file and print the bullets
    Summarise {
        /// JSON array of report records
        file: PathBuf,
        /// Only this team
        #[arg(long)]
        team: Option<String>,
        /// Report day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the department/team reporting table as HTML
    Table {
        /// Read records from a JSON file instead of the database
        #[arg(long)]
        input: Option<PathBuf>,
        /// Report day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if config.summarizer.api_key.is_none() {
        warn!("HF_API_KEY is not set, calling the summarizer without credentials");
    }

    let command = cli.command.unwrap_or(Commands::Run {
        date: None,
        input: None,
        dry_run: false,
    });

    match command {
        Commands::Run {
            date,
            input,
            dry_run,
        } => {
            let date = date.unwrap_or_else(today);
            let source = record_source(&config, input);
            let summarizer = team_summarizer(&config)?;
            let report = job::run(
                &config,
                source.as_ref(),
                &summarizer,
                date,
                &RunOptions { dry_run },
            )
            .await?;

            println!(
                "Report for {}: {} records, {} teams summarised ({} from raw entries)",
                date, report.records, report.teams_summarized, report.degraded_teams
            );
            println!("  Workbook: {}", report.workbook.display());
            if let Some(csv) = &report.csv {
                println!("  Export:   {}", csv.display());
            }
            println!("  Emailed:  {}", if report.emailed { "yes" } else { "no" });
        }
        Commands::Summarise { file, team, date } => {
            let date = date.unwrap_or_else(today);
            let records = JsonFileSource::new(file).fetch(date).await?;
            let teams = TeamTasks::from_records(&records);
            let summarizer = team_summarizer(&config)?;

            if teams.is_empty() {
                println!("No tasks reported for {}.", date);
            }
            for tasks in teams.iter() {
                if team.as_deref().is_some_and(|name| name != tasks.team) {
                    continue;
                }
                let summary = summarizer.summarize(&tasks.team, &tasks.entries).await;
                println!("=== {} ({} tasks) ===", tasks.team, tasks.entries.len());
                println!("{}\n", summary);
            }
        }
        Commands::Table { input, date } => {
            let date = date.unwrap_or_else(today);
            let records = record_source(&config, input).fetch(date).await?;
            println!("{}", notify::render_table(&reporting_summary(&records))?);
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn record_source(config: &Config, input: Option<PathBuf>) -> Box<dyn RecordSource> {
    match input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(MongoSource::new(config.source.clone())),
    }
}

fn team_summarizer(config: &Config) -> anyhow::Result<TeamSummarizer<HttpSummarizer>> {
    let client = HttpSummarizer::new(&config.summarizer)?;
    Ok(TeamSummarizer::new(client, config.pipeline.clone()))
}
