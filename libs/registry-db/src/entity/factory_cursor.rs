
use sqlx::{types::chrono, Executor, Postgres};

/// Per-factory poll cursor: the last block height a poller has fully
/// processed. Each row is owned by exactly one poller task; rows are only
/// advanced inside the transaction that commits the chunk's registry writes,
/// so a crash can never leave the cursor ahead of the written data.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct FactoryCursor {
    pub factory_name: String,
    pub last_processed_block: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl FactoryCursor {
    /// Fetch the cursor for a factory, seeding it at `seed_block` on first
    /// sight. The no-op DO UPDATE makes the insert return the existing row
    /// instead of racing a separate select.
    pub async fn find_or_seed<'c, E>(
        factory_name: &str,
        seed_block: i64,
        connection: E,
    ) -> Result<FactoryCursor, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO factory_cursors (factory_name, last_processed_block, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (factory_name) DO UPDATE SET
                factory_name = factory_cursors.factory_name
            RETURNING *
        "#;

        sqlx::query_as::<_, FactoryCursor>(query)
            .bind(factory_name)
            .bind(seed_block)
            .fetch_one(connection)
            .await
    }

    /// Advance the cursor to `block`. Called with the chunk's transaction as
    /// the executor.
    pub async fn advance<'c, E>(
        factory_name: &str,
        block: i64,
        connection: E,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE factory_cursors SET
                last_processed_block = $2,
                updated_at = NOW()
            WHERE factory_name = $1
            "#,
        )
        .bind(factory_name)
        .bind(block)
        .execute(connection)
        .await?;

        Ok(())
    }
}
