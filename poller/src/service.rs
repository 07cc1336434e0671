use std::{error::Error, str::FromStr, time::Duration};

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, FixedBytes},
    providers::{Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
};
use registry_db::{FactoryCursor, NewPair, NewToken, Pair, Token};
use sqlx::{Pool, Postgres, Transaction};
use tokio::time::sleep;

use crate::{
    config::{PollerConfig, TrackedFactory},
    decode::{self, PairCreatedEvent},
    error::AppError,
};

/// Check if an error is a rate limit error
fn is_rate_limited(err: &alloy::transports::TransportError) -> bool {
    let err_str = err.to_string().to_lowercase();
    err_str.contains("429")
        || err_str.contains("rate limit")
        || err_str.contains("too many requests")
        || err_str.contains("limit exceeded")
}

/// Fetch logs for one chunk, backing off on rate-limit responses. Any other
/// provider error is returned immediately; the caller leaves the cursor where
/// it is and the next tick retries the same range.
async fn fetch_logs_with_retry<P: Provider>(
    provider: &P,
    filter: &Filter,
    max_retries: u32,
    base_delay_ms: u64,
) -> Result<Vec<Log>, Box<dyn Error + Send + Sync>> {
    for attempt in 0..max_retries {
        match provider.get_logs(filter).await {
            Ok(logs) => {
                // Pause between calls to stay under public RPC quotas
                sleep(Duration::from_millis(base_delay_ms)).await;
                return Ok(logs);
            }
            Err(e) if is_rate_limited(&e) => {
                let backoff_ms = base_delay_ms * 2_u64.pow(attempt);
                tracing::warn!(attempt, backoff_ms, "rate limited by RPC, backing off");
                sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::MaxRetriesExceeded(max_retries).into())
}

/// Split an inclusive block range into sub-ranges of at most `max_range`
/// blocks, in increasing order.
pub fn block_chunks(from: u64, to: u64, max_range: u64) -> Vec<(u64, u64)> {
    let mut chunks = Vec::new();
    if from > to || max_range == 0 {
        return chunks;
    }

    let mut start = from;
    while start <= to {
        let end = std::cmp::min(start + max_range - 1, to);
        chunks.push((start, end));
        start = end + 1;
    }
    chunks
}

/// First-run cursor seed: start a bounded distance behind the tip instead of
/// backfilling the whole chain.
pub fn seed_block(latest: u64, max_range: u64) -> u64 {
    latest.saturating_sub(max_range)
}

fn build_filter(
    factory: &TrackedFactory,
    from_block: u64,
    to_block: u64,
) -> Result<Filter, Box<dyn Error + Send + Sync>> {
    let topic_hash = FixedBytes::<32>::from_str(factory.event_signature)
        .map_err(|_| AppError::InvalidEventSignature(factory.event_signature.to_string()))?;
    let address = Address::from_str(factory.address)
        .map_err(|_| AppError::InvalidFactoryAddress(factory.address.to_string()))?;

    Ok(Filter::new()
        .from_block(BlockNumberOrTag::Number(from_block))
        .to_block(BlockNumberOrTag::Number(to_block))
        .address(address)
        .event_signature(topic_hash))
}

/// Registry keys are lowercase hex addresses
fn addr_key(addr: &Address) -> String {
    addr.to_checksum(None).to_lowercase()
}

/// Upsert one decoded event: the pair row plus both token addresses. Runs
/// inside the chunk's transaction so a write failure rolls the whole chunk
/// back, cursor included.
async fn write_event(
    event: &PairCreatedEvent,
    factory: &TrackedFactory,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), sqlx::Error> {
    let pair_address = addr_key(&event.pair);
    let block_number = event.block_number as i64;

    let new_pair = NewPair {
        address: pair_address.clone(),
        token0_address: addr_key(&event.token0),
        token1_address: addr_key(&event.token1),
        factory_name: factory.name.to_string(),
        block_number,
    };
    Pair::create(&new_pair, &mut **tx).await?;

    for token in [&event.token0, &event.token1] {
        let new_token = NewToken {
            address: addr_key(token),
            pair_address: pair_address.clone(),
            factory_name: factory.name.to_string(),
            discovered_block: block_number,
        };
        Token::discover(&new_token, &mut **tx).await?;
    }

    Ok(())
}

/// Run one poll cycle for a factory: scan `(cursor, latest]` in bounded
/// chunks, decoding and upserting each chunk's events and advancing the
/// cursor in the same transaction.
pub async fn poll_factory_once(
    config: &PollerConfig,
    factory: &TrackedFactory,
    db_pool: Pool<Postgres>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let provider = ProviderBuilder::new().on_builtin(&config.rpc_url).await?;

    let latest_block = provider.get_block_number().await?;

    let cursor = FactoryCursor::find_or_seed(
        factory.name,
        seed_block(latest_block, config.max_block_range) as i64,
        &db_pool,
    )
    .await?;

    let last_processed = cursor.last_processed_block as u64;
    if latest_block <= last_processed {
        tracing::debug!(factory = factory.name, latest_block, "fully indexed");
        return Ok(());
    }

    for (from_block, to_block) in
        block_chunks(last_processed + 1, latest_block, config.max_block_range)
    {
        let filter = build_filter(factory, from_block, to_block)?;
        let logs =
            fetch_logs_with_retry(&provider, &filter, config.max_retries, config.rpc_delay_ms)
                .await?;

        let mut discovered = 0usize;
        let mut tx = db_pool.begin().await?;

        for log in &logs {
            // A malformed log fails alone; the rest of the chunk proceeds
            match decode::decode(log) {
                Ok(event) => {
                    write_event(&event, factory, &mut tx).await?;
                    discovered += 1;
                }
                Err(err) => {
                    tracing::warn!(factory = factory.name, %err, "skipping undecodable log");
                }
            }
        }

        FactoryCursor::advance(factory.name, to_block as i64, &mut *tx).await?;
        tx.commit().await?;

        tracing::info!(
            factory = factory.name,
            from_block,
            to_block,
            logs = logs.len(),
            discovered,
            "chunk committed"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_larger_than_chunk_size_is_split_evenly() {
        let chunks = block_chunks(1, 5000, 1000);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], (1, 1000));
        assert_eq!(chunks[4], (4001, 5000));
        for (from, to) in chunks {
            assert!(to - from + 1 <= 1000);
        }
    }

    #[test]
    fn uneven_range_ends_with_a_short_chunk() {
        let chunks = block_chunks(1001, 3500, 1000);
        assert_eq!(chunks, vec![(1001, 2000), (2001, 3000), (3001, 3500)]);
    }

    #[test]
    fn range_within_chunk_size_is_a_single_query() {
        // Cursor at 1000, tip at 1050: one query covering (1000, 1050]
        assert_eq!(block_chunks(1001, 1050, 1000), vec![(1001, 1050)]);
    }

    #[test]
    fn empty_or_inverted_range_issues_no_queries() {
        // latest == cursor has to be a no-op
        assert!(block_chunks(1051, 1050, 1000).is_empty());
        assert!(block_chunks(10, 5, 1000).is_empty());
    }

    #[test]
    fn chunks_are_strictly_increasing_and_contiguous() {
        let chunks = block_chunks(7, 4242, 100);
        for window in chunks.windows(2) {
            assert_eq!(window[0].1 + 1, window[1].0);
        }
        assert_eq!(chunks.first().unwrap().0, 7);
        assert_eq!(chunks.last().unwrap().1, 4242);
    }

    #[test]
    fn first_run_seeds_a_bounded_distance_behind_the_tip() {
        assert_eq!(seed_block(5000, 1000), 4000);
        // Young chains never underflow
        assert_eq!(seed_block(500, 1000), 0);
    }
}
