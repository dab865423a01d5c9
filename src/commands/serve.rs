//! Serve command - Starts the HTTP server and the email worker.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::{Config, EMAIL_WORKER_DRAIN_TIMEOUT_SECS, TOKEN_PURGE_INTERVAL_SECS};
use crate::errors::{AppError, AppResult};
use crate::infra::{EmailQueue, LogMailer};
use crate::jobs::run_email_worker;
use crate::services::{PasswordService, ServiceContainer, Services};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let (queue, receiver) = EmailQueue::bounded(config.email_queue_capacity);
    let mailer = Arc::new(LogMailer::new(config.mail_from.clone()));
    let worker = tokio::spawn(run_email_worker(receiver, mailer));

    let services = Services::in_memory(&config, queue.clone());
    if let Some(seed) = &config.admin_seed {
        services
            .registration()
            .seed_admin(&seed.email, &seed.password)
            .await?;
    }

    let purger = tokio::spawn(purge_tokens_periodically(services.passwords()));
    let app = create_router(AppState::new(&services, queue));
    // Only the router may keep email senders alive from here on.
    drop(services);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // The purger holds a sender too; stop it so the worker sees the queue close.
    purger.abort();
    let _ = purger.await;

    match tokio::time::timeout(Duration::from_secs(EMAIL_WORKER_DRAIN_TIMEOUT_SECS), worker).await {
        Ok(Ok(delivered)) => tracing::info!(delivered, "Email worker drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Email worker panicked"),
        Err(_) => tracing::warn!("Email worker did not drain in time"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn purge_tokens_periodically(passwords: Arc<dyn PasswordService>) {
    let mut interval = tokio::time::interval(Duration::from_secs(TOKEN_PURGE_INTERVAL_SECS));
    loop {
        interval.tick().await;
        if let Err(e) = passwords.purge_expired_tokens().await {
            tracing::warn!(error = %e, "Reset token purge failed");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
