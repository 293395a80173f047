//! Catalog Sync Main Entry Point
//!
//! Keeps the OpenSearch product index in sync with the PostgreSQL catalog
//! until interrupted.

use catalog_sync::{Dependencies, SetupError, Settings};
use dotenv::dotenv;
use std::env;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_sync=info,catalog_sync_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "catalog-sync",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), SetupError> {
    dotenv().ok();
    init_tracing();

    info!("Starting catalog sync");

    let settings = Settings::from_env();
    let shutdown = CancellationToken::new();

    let deps = match Dependencies::new(&settings, &shutdown).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");

    shutdown.cancel();
    let stats = deps.components.stop().await;
    info!(
        processed = stats.processed,
        failed = stats.failed,
        poisoned = stats.poisoned,
        purged = stats.purged,
        "Catalog sync stopped"
    );

    Ok(())
}
