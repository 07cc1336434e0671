use std::{collections::HashMap, error::Error, str::FromStr};

use registry_db::{MarketData, Token};
use sqlx::{types::BigDecimal, Pool, Postgres};

use crate::dexscreener::{DexScreenerClient, PairInfo, MAX_BATCH};

/// Enricher settings, read from the environment once at startup
#[derive(Debug, Clone)]
pub struct EnricherConfig {
    pub lookback_days: i32,
    pub refresh_minutes: i32,
    pub batch_size: i32,
}

/// Outcome of one address's enrichment lookup. Every address in a batch
/// yields exactly one outcome: either real market data or an explicit
/// fallback, never a silent omission. Downstream readers can tell "no data
/// available" apart from a genuine zero.
#[derive(Debug)]
pub enum EnrichmentOutcome {
    Enriched(MarketData),
    Fallback,
}

/// Index aggregator pairs by their base token address, keeping only the most
/// liquid pair per token.
pub fn index_by_base_token(pairs: Vec<PairInfo>) -> HashMap<String, PairInfo> {
    let mut by_token: HashMap<String, PairInfo> = HashMap::new();

    for pair in pairs {
        let key = pair.base_token.address.to_lowercase();
        let replace = match by_token.get(&key) {
            Some(existing) => pair.liquidity_usd() > existing.liquidity_usd(),
            None => true,
        };
        if replace {
            by_token.insert(key, pair);
        }
    }

    by_token
}

/// Resolve the outcome for one registry address against an indexed response
pub fn outcome_for(address: &str, by_token: &HashMap<String, PairInfo>) -> EnrichmentOutcome {
    match by_token.get(&address.to_lowercase()) {
        Some(pair) => EnrichmentOutcome::Enriched(to_market_data(pair)),
        None => EnrichmentOutcome::Fallback,
    }
}

fn to_market_data(pair: &PairInfo) -> MarketData {
    MarketData {
        name: pair.base_token.name.clone(),
        symbol: pair.base_token.symbol.clone(),
        price_usd: pair
            .price_usd
            .as_deref()
            .and_then(|p| BigDecimal::from_str(p).ok()),
        // FDV stands in when the aggregator has no circulating market cap
        market_cap_usd: pair
            .market_cap
            .or(pair.fdv)
            .and_then(|v| BigDecimal::try_from(v).ok()),
        liquidity_usd: pair
            .liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .and_then(|v| BigDecimal::try_from(v).ok()),
        volume_24h_usd: pair
            .volume
            .as_ref()
            .and_then(|v| v.h24)
            .and_then(|v| BigDecimal::try_from(v).ok()),
    }
}

/// Run one enrichment cycle: select the due batch, query the aggregator in
/// address chunks, and merge each outcome back into the registry. Returns the
/// number of entries written.
pub async fn run_cycle(
    config: &EnricherConfig,
    client: &DexScreenerClient,
    db_pool: &Pool<Postgres>,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let due = Token::find_needing_enrichment(
        config.lookback_days,
        config.refresh_minutes,
        config.batch_size,
        db_pool,
    )
    .await?;

    if due.is_empty() {
        return Ok(0);
    }

    let mut written = 0usize;

    for chunk in due.chunks(MAX_BATCH) {
        let addresses: Vec<String> = chunk.iter().map(|t| t.address.clone()).collect();

        // A failed aggregator call is transient: skip the chunk and let the
        // next cycle re-select the same addresses
        let pairs = match client.token_pairs(&addresses).await {
            Ok(pairs) => pairs,
            Err(err) => {
                tracing::warn!(addresses = addresses.len(), %err, "aggregator batch failed");
                continue;
            }
        };

        let by_token = index_by_base_token(pairs);

        for token in chunk {
            let result = match outcome_for(&token.address, &by_token) {
                EnrichmentOutcome::Enriched(data) => {
                    tracing::debug!(address = %token.address, symbol = ?data.symbol, "enriched");
                    Token::update_market_data(&token.address, &data, db_pool).await
                }
                EnrichmentOutcome::Fallback => {
                    tracing::debug!(address = %token.address, "no aggregator data, flagged fallback");
                    Token::mark_enrichment_fallback(&token.address, db_pool).await
                }
            };

            match result {
                Ok(()) => written += 1,
                Err(err) => {
                    // One failing write never blocks the rest of the batch
                    tracing::warn!(address = %token.address, %err, "registry write failed");
                }
            }
        }
    }

    Ok(written)
}
