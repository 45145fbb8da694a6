//! Email delivery of the rendered report.
//!
//! The HTML body is rendered with Handlebars and sent over SMTP with lettre,
//! with the workbook attached.

use crate::config::{ConfigError, EmailConfig};
use crate::tasks::TeamReporting;
use chrono::NaiveDate;
use handlebars::Handlebars;
use lazy_static::lazy_static;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

lazy_static! {
    static ref XLSX: ContentType =
        ContentType::parse(XLSX_CONTENT_TYPE).expect("valid xlsx content type");
}

const PLAIN_BODY: &str = "This email requires HTML support.";

const TABLE_TEMPLATE: &str = r#"<table style="border-collapse:collapse; width:90%;">
  <thead>
    <tr style="background:#f2f2f2;">
      <th style="border:1px solid #ccc; padding:6px; text-align:center;">Department</th>
      <th style="border:1px solid #ccc; padding:6px; text-align:center;">Team</th>
      <th style="border:1px solid #ccc; padding:6px; text-align:center;">Tasks Reported</th>
    </tr>
  </thead>
  <tbody>
{{#each rows}}
    <tr>
      <td style="border:1px solid #ccc; padding:6px; text-align:center;">{{department}}</td>
      <td style="border:1px solid #ccc; padding:6px; text-align:center;">{{team}}</td>
      <td style="border:1px solid #ccc; padding:6px; text-align:center;">{{reported}}</td>
    </tr>
{{/each}}
  </tbody>
</table>"#;

const BODY_TEMPLATE: &str = r#"<html><body>
  <p>{{greeting}}</p>
  <p>Please find attached the daily summarized work report.</p>
  <p><b>Department &amp; Team-wise Reporting Summary ({{date}})</b></p>
  {{{table}}}
  <p>{{#each signature}}{{this}}{{#unless @last}}<br/>{{/unless}}{{/each}}</p>
</body></html>"#;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("no recipients configured")]
    NoRecipients,
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("failed to read attachment: {0}")]
    Attachment(#[from] std::io::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

fn templates() -> Result<Handlebars<'static>, NotifyError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_template_string("table", TABLE_TEMPLATE)?;
    handlebars.register_template_string("body", BODY_TEMPLATE)?;
    Ok(handlebars)
}

/// HTML table of reporting counts per department and team.
pub fn render_table(rows: &[TeamReporting]) -> Result<String, NotifyError> {
    Ok(templates()?.render("table", &json!({ "rows": rows }))?)
}

/// Full HTML body around the reporting table.
pub fn render_body(
    config: &EmailConfig,
    rows: &[TeamReporting],
    date: NaiveDate,
) -> Result<String, NotifyError> {
    let handlebars = templates()?;
    let table = handlebars.render("table", &json!({ "rows": rows }))?;
    Ok(handlebars.render(
        "body",
        &json!({
            "greeting": config.greeting,
            "date": date.format("%d-%b-%Y").to_string(),
            "table": table,
            "signature": config.signature,
        }),
    )?)
}

pub fn subject(date: NaiveDate) -> String {
    format!("📊 Daily Work Report Summary - {}", date.format("%d %B %Y"))
}

/// Assemble the multipart message: plain fallback, HTML body, workbook attachment.
pub fn build_message(
    config: &EmailConfig,
    rows: &[TeamReporting],
    attachment: &Path,
    date: NaiveDate,
) -> Result<Message, NotifyError> {
    if config.recipients.is_empty() {
        return Err(NotifyError::NoRecipients);
    }
    let (sender, _) = config.credentials()?;

    let mut builder = Message::builder()
        .from(sender.parse::<Mailbox>()?)
        .subject(subject(date));
    for recipient in &config.recipients {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    let file_name = attachment
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.xlsx".to_string());
    let workbook = Attachment::new(file_name).body(std::fs::read(attachment)?, XLSX.clone());

    let html = render_body(config, rows, date)?;
    let message = builder.multipart(
        MultiPart::mixed()
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(PLAIN_BODY.to_string()))
                    .singlepart(SinglePart::html(html)),
            )
            .singlepart(workbook),
    )?;
    Ok(message)
}

/// Sends report emails over STARTTLS SMTP.
pub struct Notifier {
    config: EmailConfig,
}

impl Notifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub async fn send_report(
        &self,
        rows: &[TeamReporting],
        attachment: &Path,
        date: NaiveDate,
    ) -> Result<(), NotifyError> {
        let message = build_message(&self.config, rows, attachment, date)?;
        let (sender, password) = self.config.credentials()?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        mailer.send(message).await?;
        info!(recipients = self.config.recipients.len(), "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<TeamReporting> {
        vec![
            TeamReporting {
                department: "Tech".to_string(),
                team: "Data".to_string(),
                reported: 3,
            },
            TeamReporting {
                department: "R&D".to_string(),
                team: "<Labs>".to_string(),
                reported: 0,
            },
        ]
    }

    fn email_config() -> EmailConfig {
        EmailConfig {
            sender: Some("reports@example.com".to_string()),
            password: Some("secret".to_string()),
            recipients: vec!["lead@example.com".to_string()],
            greeting: "Dear Robbin,".to_string(),
            signature: vec!["Regards,".to_string(), "Data & Tech Lead".to_string()],
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_table_escapes_values() {
        let html = render_table(&rows()).unwrap();
        assert!(html.contains(">Tech</td>"));
        assert!(html.contains(">3</td>"));
        assert!(html.contains("R&amp;D"));
        assert!(html.contains("&lt;Labs&gt;"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_body_embeds_table_and_signature() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let html = render_body(&email_config(), &rows(), date).unwrap();
        assert!(html.contains("<p>Dear Robbin,</p>"));
        assert!(html.contains("(19-Oct-2026)"));
        assert!(html.contains("<table"));
        assert!(html.contains("Regards,<br/>Data &amp; Tech Lead</p>"));
    }

    #[test]
    fn test_subject_uses_long_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(subject(date), "📊 Daily Work Report Summary - 19 October 2026");
    }

    #[test]
    fn test_build_message_with_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = dir.path().join("Daily_Work_Report.xlsx");
        std::fs::write(&attachment, b"workbook bytes").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let message = build_message(&email_config(), &rows(), &attachment, date).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("To: lead@example.com"));
        assert!(raw.contains("From: reports@example.com"));
        assert!(raw.contains("Daily_Work_Report.xlsx"));
        assert!(raw.contains(XLSX_CONTENT_TYPE));
    }

    #[test]
    fn test_build_message_requires_recipients_and_sender() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = dir.path().join("report.xlsx");
        std::fs::write(&attachment, b"x").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let config = EmailConfig {
            recipients: Vec::new(),
            ..email_config()
        };
        assert!(matches!(
            build_message(&config, &rows(), &attachment, date),
            Err(NotifyError::NoRecipients)
        ));

        let config = EmailConfig {
            sender: None,
            ..email_config()
        };
        assert!(matches!(
            build_message(&config, &rows(), &attachment, date),
            Err(NotifyError::Config(_))
        ));
    }
}
