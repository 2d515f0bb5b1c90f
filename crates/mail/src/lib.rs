//! Mail delivery seam and report rendering.
//!
//! The pipeline talks to [`Mailer`], a one-method trait: deliver one HTML
//! message to one recipient. Transport (SMTP, provider APIs) lives behind
//! that seam and is out of scope here; [`FileMailer`] writes messages to an
//! outbox directory for local runs and tests.
//!
//! [`send_report`] owns the per-recipient loop: one recipient's failure is
//! logged and counted, and never blocks delivery to the others.

pub mod render;

use std::fs;
use std::path::PathBuf;

use tracing::{error, info};

use cimawatch_types::EmailAddress;

/// Errors from a mail transport.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("failed to write outbox message: {0}")]
    OutboxWrite(std::io::Error),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// One-recipient mail delivery.
pub trait Mailer {
    /// Delivers one HTML message. Implementations must treat each call as
    /// independent; the caller handles retry/aggregation policy.
    fn send(&self, recipient: &EmailAddress, subject: &str, html_body: &str)
        -> Result<(), MailError>;
}

/// Per-recipient delivery tallies for one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers one report to every recipient independently.
///
/// Failures are logged per recipient and tallied; the loop always visits
/// every recipient.
pub fn send_report(
    mailer: &dyn Mailer,
    recipients: &[EmailAddress],
    subject: &str,
    html_body: &str,
) -> DeliveryOutcome {
    let mut outcome = DeliveryOutcome::default();
    for recipient in recipients {
        match mailer.send(recipient, subject, html_body) {
            Ok(()) => {
                info!(recipient = %recipient, "report delivered");
                outcome.delivered += 1;
            }
            Err(e) => {
                error!(recipient = %recipient, error = %e, "report delivery failed");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Writes each message as an HTML file into an outbox directory.
///
/// Filenames carry a millisecond timestamp and the sanitized recipient so
/// repeated runs never collide. The subject is embedded as an HTML comment
/// on the first line.
#[derive(Debug, Clone)]
pub struct FileMailer {
    outbox_dir: PathBuf,
}

impl FileMailer {
    pub fn new(outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
        }
    }
}

impl Mailer for FileMailer {
    fn send(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        fs::create_dir_all(&self.outbox_dir).map_err(MailError::OutboxWrite)?;

        let safe_recipient: String = recipient
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        let filename = format!(
            "{}-{}.html",
            chrono::Utc::now().timestamp_millis(),
            safe_recipient
        );

        let content = format!("<!-- Subject: {subject} -->\n{html_body}");
        fs::write(self.outbox_dir.join(filename), content).map_err(MailError::OutboxWrite)
    }
}
