//! CypherX registry enricher
//!
//! Decoupled from the poller: on its own schedule, picks recently discovered
//! registry entries that lack market data (or whose data has gone stale) and
//! merges DexScreener metrics back in. An address the aggregator does not
//! know gets an explicitly flagged fallback row, never an omission.

use std::{env, error::Error};

use dexscreener::DexScreenerClient;
use error::AppError;
use registry_db::initialize_database;
use service::EnricherConfig;
use tokio::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod dexscreener;
mod error;
mod service;

mod defaults {
    pub const ENRICH_INTERVAL_SECS: &str = "60";
    pub const LOOKBACK_DAYS: &str = "7";
    pub const REFRESH_MINUTES: &str = "30";
    pub const BATCH_SIZE: &str = "100";
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|_| AppError::InvalidConfig(key.to_string(), raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enricher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CypherX registry enricher...");

    let db_pool = initialize_database().await?;
    let client = DexScreenerClient::new()?;

    let interval_secs: u64 = env_parse("ENRICH_INTERVAL_SECS", defaults::ENRICH_INTERVAL_SECS)?;
    let config = EnricherConfig {
        lookback_days: env_parse("LOOKBACK_DAYS", defaults::LOOKBACK_DAYS)?,
        refresh_minutes: env_parse("REFRESH_MINUTES", defaults::REFRESH_MINUTES)?,
        batch_size: env_parse("BATCH_SIZE", defaults::BATCH_SIZE)?,
    };

    tracing::info!(
        interval_secs,
        lookback_days = config.lookback_days,
        refresh_minutes = config.refresh_minutes,
        batch_size = config.batch_size,
        "enricher started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service::run_cycle(&config, &client, &db_pool).await {
                    Ok(0) => tracing::debug!("nothing due for enrichment"),
                    Ok(written) => tracing::info!(written, "enrichment cycle complete"),
                    Err(err) => tracing::error!(%err, "enrichment cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
