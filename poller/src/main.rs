//! CypherX chain log poller
//!
//! Watches configured DEX factory contracts on Base for PairCreated events
//! and records every newly seen token address in the registry. One periodic
//! task per factory; cursors are persisted per factory so restarts resume
//! where the last committed chunk left off.

use config::PollerConfig;
use registry_db::initialize_database;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod decode;
mod error;
mod service;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CypherX token discovery poller...");

    let db_pool = initialize_database().await?;
    let poller_config = PollerConfig::from_env()?;

    let factories: Vec<_> = config::tracked_factories()
        .into_iter()
        .filter(|f| f.enabled)
        .collect();

    tracing::info!(
        factories = factories.len(),
        interval_secs = poller_config.poll_interval.as_secs(),
        max_block_range = poller_config.max_block_range,
        "watching factories for PairCreated events"
    );

    // Coordinated shutdown: every poller task selects on this channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(factories.len());
    for factory in factories {
        let config = poller_config.clone();
        let pool = db_pool.clone();
        let mut shutdown = shutdown_rx.clone();

        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // An error leaves the cursor at the last committed
                        // chunk; the same range is retried next tick
                        if let Err(err) = service::poll_factory_once(&config, &factory, pool.clone()).await {
                            tracing::error!(factory = factory.name, %err, "poll cycle failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!(factory = factory.name, "poller stopped");
                        break;
                    }
                }
            }
        }));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
