//! User Registry - Application entry point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_registry::{
    cli::{Cli, Commands},
    commands,
    config::{Branding, Config},
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, load_config()).await,
        Commands::Templates(args) => commands::templates::execute(args, &Branding::from_env()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

/// Load the full configuration or exit. Only commands that need secrets call this.
fn load_config() -> Config {
    match Config::from_env() {
        Ok(config) => {
            tracing::debug!(?config, "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::error!(error = ?e, "Invalid configuration");
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber (verbose mode forces debug level)
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
