//! Email service - Renders templates and queues the result.

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::EmailQueue;
use crate::jobs::EmailJob;
use crate::utils::{EmailTemplate, TemplateContext};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Templated email sending.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Render `template` with `context` and queue it for `to`.
    async fn send_template(
        &self,
        to: &str,
        template: EmailTemplate,
        context: TemplateContext,
    ) -> AppResult<()>;
}

/// Renders templates and pushes them onto the email queue.
///
/// `app_name` and `base_url` are filled in unless the caller set them.
pub struct TemplatedEmailer {
    queue: EmailQueue,
    app_name: String,
    base_url: String,
    from: String,
}

impl TemplatedEmailer {
    pub fn new(queue: EmailQueue, config: &Config) -> Self {
        Self {
            queue,
            app_name: config.branding.app_name.clone(),
            base_url: config.branding.app_base_url.clone(),
            from: config.mail_from.clone(),
        }
    }
}

#[async_trait]
impl EmailService for TemplatedEmailer {
    async fn send_template(
        &self,
        to: &str,
        template: EmailTemplate,
        mut context: TemplateContext,
    ) -> AppResult<()> {
        context.insert_default("app_name", &self.app_name);
        context.insert_default("base_url", &self.base_url);

        let email = template.render(&context)?;
        let job = EmailJob::new(to, email.subject, email.body).with_from(&self.from);
        self.queue.enqueue(job).await?;

        tracing::debug!(to = %to, template = %template, "Email queued");
        Ok(())
    }
}

/// Queue a notification without failing the calling operation.
pub(crate) async fn notify(
    emails: &dyn EmailService,
    to: &str,
    template: EmailTemplate,
    context: TemplateContext,
) {
    if let Err(e) = emails.send_template(to, template, context).await {
        tracing::warn!(to = %to, template = %template, error = %e, "Failed to queue email");
    }
}
