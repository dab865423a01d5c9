//! Outbound email transport.
//!
//! Services never talk to a transport directly: they push `EmailJob`s onto
//! the `EmailQueue` and the email worker hands them to a `Mailer`.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::{AppError, AppResult};
use crate::jobs::EmailJob;

/// Sending side of the email job queue.
#[derive(Clone, Debug)]
pub struct EmailQueue {
    sender: mpsc::Sender<EmailJob>,
}

impl EmailQueue {
    /// Create a bounded queue and the receiver the worker drains.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<EmailJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Push a job. Waits while the queue is full.
    ///
    /// # Errors
    /// Fails if the worker has shut down.
    pub async fn enqueue(&self, job: EmailJob) -> AppResult<()> {
        self.sender
            .send(job)
            .await
            .map_err(|e| AppError::internal(format!("Email worker is not running (to: {})", e.0.to)))
    }

    /// True once the worker has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, job: &EmailJob) -> AppResult<()>;
}

/// Development transport: writes the email to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    default_from: String,
}

impl LogMailer {
    pub fn new(default_from: impl Into<String>) -> Self {
        Self {
            default_from: default_from.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, job: &EmailJob) -> AppResult<()> {
        let from = job.from.as_deref().unwrap_or(&self.default_from);

        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            from,
            job.to,
            job.subject,
            job.body
        );
        Ok(())
    }
}
