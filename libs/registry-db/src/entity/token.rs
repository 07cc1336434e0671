
use sqlx::{
    types::{chrono, BigDecimal},
    Executor, Postgres,
};

/// Token registry entry. Created on first sighting by the poller, mutated by
/// the enricher, never deleted by this pipeline.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Token {
    pub address: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub discovered_block: Option<i64>,
    pub pair_address: Option<String>,
    pub factory_name: Option<String>,

    // Enrichment fields
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: Option<BigDecimal>,
    pub market_cap_usd: Option<BigDecimal>,
    pub liquidity_usd: Option<BigDecimal>,
    pub volume_24h_usd: Option<BigDecimal>,
    pub holder_count: Option<i32>,

    pub enriched_at: Option<chrono::DateTime<chrono::Utc>>,
    pub enrichment_fallback: bool,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Input for recording a newly discovered token
#[derive(Debug, Clone)]
pub struct NewToken {
    pub address: String,
    pub pair_address: String,
    pub factory_name: String,
    pub discovered_block: i64,
}

/// Market data merged back by the enricher
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: Option<BigDecimal>,
    pub market_cap_usd: Option<BigDecimal>,
    pub liquidity_usd: Option<BigDecimal>,
    pub volume_24h_usd: Option<BigDecimal>,
}

impl Token {
    /// Record a discovered token address.
    ///
    /// Merge upsert: `created_at` is first-write-wins so replaying a block
    /// range never resets a token's discovery time, and enrichment fields
    /// already present on the row are left untouched.
    pub async fn discover<'c, E>(token: &NewToken, connection: E) -> Result<Token, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO tokens (address, pair_address, factory_name, discovered_block, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (address) DO UPDATE SET
                pair_address = COALESCE(tokens.pair_address, EXCLUDED.pair_address),
                factory_name = COALESCE(tokens.factory_name, EXCLUDED.factory_name),
                discovered_block = COALESCE(tokens.discovered_block, EXCLUDED.discovered_block),
                last_updated = NOW()
            RETURNING *
        "#;

        sqlx::query_as::<_, Token>(query)
            .bind(&token.address)
            .bind(&token.pair_address)
            .bind(&token.factory_name)
            .bind(token.discovered_block)
            .fetch_one(connection)
            .await
    }

    /// Find token by address
    pub async fn find_by_address<'c, E>(
        address: &str,
        connection: E,
    ) -> Result<Option<Token>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE address = $1")
            .bind(address)
            .fetch_optional(connection)
            .await
    }

    /// Get newest tokens (for /api/tokens/new)
    pub async fn find_newest<'c, E>(limit: i32, connection: E) -> Result<Vec<Token>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(connection)
            .await
    }

    /// Select a bounded batch of entries due for enrichment: created within
    /// the lookback window and never enriched, or last enriched longer than
    /// `refresh_minutes` ago.
    pub async fn find_needing_enrichment<'c, E>(
        lookback_days: i32,
        refresh_minutes: i32,
        limit: i32,
        connection: E,
    ) -> Result<Vec<Token>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query_as::<_, Token>(
            r#"
            SELECT * FROM tokens
            WHERE created_at > NOW() - ($1 * INTERVAL '1 day')
              AND (enriched_at IS NULL OR enriched_at < NOW() - ($2 * INTERVAL '1 minute'))
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(lookback_days)
        .bind(refresh_minutes)
        .bind(limit)
        .fetch_all(connection)
        .await
    }

    /// Merge market data back into the registry. Name and symbol keep an
    /// existing value when the aggregator returns none.
    pub async fn update_market_data<'c, E>(
        address: &str,
        data: &MarketData,
        connection: E,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE tokens SET
                name = COALESCE($2, tokens.name),
                symbol = COALESCE($3, tokens.symbol),
                price_usd = $4,
                market_cap_usd = $5,
                liquidity_usd = $6,
                volume_24h_usd = $7,
                enriched_at = NOW(),
                enrichment_fallback = FALSE,
                last_updated = NOW()
            WHERE address = $1
            "#,
        )
        .bind(address)
        .bind(&data.name)
        .bind(&data.symbol)
        .bind(&data.price_usd)
        .bind(&data.market_cap_usd)
        .bind(&data.liquidity_usd)
        .bind(&data.volume_24h_usd)
        .execute(connection)
        .await?;

        Ok(())
    }

    /// Flag an entry the aggregator had no data for. The row keeps its shape
    /// and drops out of the enrichment batch until the next refresh.
    pub async fn mark_enrichment_fallback<'c, E>(
        address: &str,
        connection: E,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE tokens SET
                enriched_at = NOW(),
                enrichment_fallback = TRUE,
                last_updated = NOW()
            WHERE address = $1
            "#,
        )
        .bind(address)
        .execute(connection)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use sqlx::PgPool;

    use super::*;

    fn discovery(address: &str, pair: &str, block: i64) -> NewToken {
        NewToken {
            address: address.to_string(),
            pair_address: pair.to_string(),
            factory_name: "uniswap_v2".to_string(),
            discovered_block: block,
        }
    }

    #[sqlx::test]
    #[ignore = "needs a live Postgres via DATABASE_URL"]
    async fn rediscovery_preserves_created_at_and_enrichment(pool: PgPool) {
        let address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

        let first = Token::discover(&discovery(address, "0xpair1", 1025), &pool)
            .await
            .unwrap();

        let data = MarketData {
            name: Some("Example".to_string()),
            symbol: Some("EXM".to_string()),
            price_usd: BigDecimal::from_str("0.004217").ok(),
            market_cap_usd: Some(BigDecimal::from(421_700)),
            liquidity_usd: Some(BigDecimal::from(85_000)),
            volume_24h_usd: Some(BigDecimal::from(120_345)),
        };
        Token::update_market_data(address, &data, &pool).await.unwrap();

        // Replaying the range re-discovers the same address with different
        // inputs; discovery time and enrichment must both survive
        let replayed = Token::discover(&discovery(address, "0xpair2", 2050), &pool)
            .await
            .unwrap();

        assert_eq!(replayed.created_at, first.created_at);
        assert_eq!(replayed.pair_address.as_deref(), Some("0xpair1"));
        assert_eq!(replayed.discovered_block, Some(1025));
        assert_eq!(replayed.name.as_deref(), Some("Example"));
        assert_eq!(replayed.symbol.as_deref(), Some("EXM"));
        assert!(replayed.price_usd.is_some());
        assert!(replayed.market_cap_usd.is_some());
    }

    #[sqlx::test]
    #[ignore = "needs a live Postgres via DATABASE_URL"]
    async fn fallback_flag_clears_on_successful_enrichment(pool: PgPool) {
        let address = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

        Token::discover(&discovery(address, "0xpair1", 1), &pool)
            .await
            .unwrap();

        Token::mark_enrichment_fallback(address, &pool).await.unwrap();
        let flagged = Token::find_by_address(address, &pool).await.unwrap().unwrap();
        assert!(flagged.enrichment_fallback);
        assert!(flagged.enriched_at.is_some());

        Token::update_market_data(address, &MarketData::default(), &pool)
            .await
            .unwrap();
        let enriched = Token::find_by_address(address, &pool).await.unwrap().unwrap();
        assert!(!enriched.enrichment_fallback);
    }
}
