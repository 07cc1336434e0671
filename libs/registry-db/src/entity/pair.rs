
use sqlx::{types::chrono, Executor, Postgres};

/// Pair entity representing a discovered DEX trading pair
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Pair {
    pub address: String,
    pub token0_address: String,
    pub token1_address: String,
    pub factory_name: String,
    pub block_number: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Input for recording a new pair
#[derive(Debug, Clone)]
pub struct NewPair {
    pub address: String,
    pub token0_address: String,
    pub token1_address: String,
    pub factory_name: String,
    pub block_number: i64,
}

impl Pair {
    /// Record a pair. Returns `None` when the pair was already known, which
    /// makes range replays idempotent.
    pub async fn create<'c, E>(pair: &NewPair, connection: E) -> Result<Option<Pair>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO pairs (address, token0_address, token1_address, factory_name, block_number)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (address) DO NOTHING
            RETURNING *
        "#;

        sqlx::query_as::<_, Pair>(query)
            .bind(&pair.address)
            .bind(&pair.token0_address)
            .bind(&pair.token1_address)
            .bind(&pair.factory_name)
            .bind(pair.block_number)
            .fetch_optional(connection)
            .await
    }

    /// Find pair by address
    pub async fn find_by_address<'c, E>(
        address: &str,
        connection: E,
    ) -> Result<Option<Pair>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query_as::<_, Pair>("SELECT * FROM pairs WHERE address = $1")
            .bind(address)
            .fetch_optional(connection)
            .await
    }

    /// Get the most recently discovered pairs
    pub async fn find_recent<'c, E>(limit: i32, connection: E) -> Result<Vec<Pair>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query_as::<_, Pair>("SELECT * FROM pairs ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(connection)
            .await
    }
}
