//! Email background job.
//!
//! Jobs are produced by the services through `EmailQueue` and consumed by
//! `run_email_worker`, which forwards each one to the configured `Mailer`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::infra::Mailer;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email address
    pub to: String,
    /// Email subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional sender override (defaults to MAIL_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// Drain the queue until every sender is dropped.
///
/// A failed send is logged and the worker moves on. Returns the number of
/// jobs delivered successfully.
pub async fn run_email_worker(
    mut receiver: mpsc::Receiver<EmailJob>,
    mailer: Arc<dyn Mailer>,
) -> usize {
    tracing::info!("Email worker started");
    let mut delivered = 0;

    while let Some(job) = receiver.recv().await {
        tracing::debug!(to = %job.to, subject = %job.subject, "Processing email job");

        match mailer.send(&job).await {
            Ok(()) => {
                delivered += 1;
                tracing::info!(to = %job.to, "Email processed successfully");
            }
            Err(e) => {
                tracing::error!(to = %job.to, error = %e, "Email delivery failed");
            }
        }
    }

    tracing::info!(delivered, "Email worker stopped");
    delivered
}
