//! # Daily Digest
//!
//! A batch job that turns the day's per-employee task reports into per-team
//! bullet summaries, writes them into a spreadsheet template and emails it.
//!
//! ## Features
//!
//! - **Resilient Summaries**: direct, chunked and combined calls to a remote summariser,
//!   degrading to raw entries so every team always gets bullets
//! - **Template Rendering**: fills a pre-formatted xlsx with umya-spreadsheet
//! - **Delivery**: SMTP email with an HTML reporting table and the workbook attached

pub mod bullets;
pub mod client;
pub mod config;
pub mod export;
pub mod job;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod response;
pub mod source;
pub mod summary;
pub mod tasks;

pub use client::{HttpSummarizer, Summarize, SummarizerError};
pub use config::Config;
pub use pipeline::TeamSummarizer;
pub use response::SummaryResponse;
pub use summary::TeamSummary;
