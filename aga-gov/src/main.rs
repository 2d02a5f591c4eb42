//! AGA governance service (aga-gov) - main entry point
//!
//! Resolves configuration, opens the store and serves the governance API.

use std::path::PathBuf;

use aga_common::config::{ConfigOverrides, GovernanceConfig};
use aga_common::db::Store;
use aga_gov::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for aga-gov.
///
/// Each option overrides the matching `AGA_*` environment variable and
/// config file entry.
#[derive(Parser, Debug)]
#[command(name = "aga-gov")]
#[command(about = "Architecture governance service")]
#[command(version)]
struct Args {
    /// SQLite database file; without one the service is read-empty
    #[arg(short, long)]
    database_path: Option<PathBuf>,

    /// Shared secret for webhook signatures
    #[arg(long)]
    webhook_secret: Option<String>,

    /// Address to listen on
    #[arg(short, long)]
    bind_address: Option<String>,

    /// Tracing filter directive, e.g. "aga_gov=debug"
    #[arg(long)]
    log_filter: Option<String>,

    /// Config file (defaults to ~/.config/aga/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.database_path,
            webhook_secret: self.webhook_secret,
            bind_address: self.bind_address,
            log_filter: self.log_filter,
            config_file: self.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = GovernanceConfig::resolve(&args.overrides()).context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_filter))?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AGA governance service (aga-gov) v{}", env!("CARGO_PKG_VERSION"));

    if config.webhook_secret().is_none() {
        warn!("No webhook secret configured; all webhooks will be rejected");
    }

    let store = Store::open(&config).await.context("Failed to open store")?;
    if let Some(path) = &config.database_path {
        info!("Database path: {}", path.display());
    }

    let bind_address = config.bind_address.clone();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("aga-gov listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
