//! Token API routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use registry_db::entity::token::Token;

use crate::AppState;

/// Helper to convert BigDecimal to f64
fn bd_to_f64(bd: &sqlx::types::BigDecimal) -> f64 {
    bd.to_string().parse().unwrap_or(0.0)
}

/// Token response item - matches the frontend token shape. `fallback` is true
/// when the aggregator had no data for the address; the zeroed metrics then
/// mean "unknown", not literal zero.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenItem {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume24h: f64,
    /// Null until a holder data source feeds the registry
    pub holders: Option<i32>,
    pub pair_address: Option<String>,
    pub factory: Option<String>,
    pub discovered_block: Option<i64>,
    pub created_at: String,
    pub enriched_at: Option<String>,
    pub fallback: bool,
    pub chain: String,
}

impl From<Token> for TokenItem {
    fn from(t: Token) -> Self {
        Self {
            name: t.name.unwrap_or_else(|| "Unknown".to_string()),
            symbol: t.symbol.unwrap_or_else(|| "???".to_string()),
            price: t.price_usd.as_ref().map(bd_to_f64).unwrap_or(0.0),
            market_cap: t.market_cap_usd.as_ref().map(bd_to_f64).unwrap_or(0.0),
            liquidity: t.liquidity_usd.as_ref().map(bd_to_f64).unwrap_or(0.0),
            volume24h: t.volume_24h_usd.as_ref().map(bd_to_f64).unwrap_or(0.0),
            holders: t.holder_count,
            pair_address: t.pair_address,
            factory: t.factory_name,
            discovered_block: t.discovered_block,
            created_at: t.created_at.to_rfc3339(),
            enriched_at: t.enriched_at.map(|dt| dt.to_rfc3339()),
            fallback: t.enrichment_fallback,
            chain: "base".to_string(),
            address: t.address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
}

pub const DEFAULT_LIMIT: i32 = 50;
pub const MAX_LIMIT: i32 = 200;

/// GET /api/tokens/new - most recently discovered tokens
pub async fn get_new_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    match Token::find_newest(limit, &state.db_pool).await {
        Ok(tokens) => {
            let items: Vec<TokenItem> = tokens.into_iter().map(TokenItem::from).collect();
            Json(items).into_response()
        }
        Err(err) => {
            tracing::error!(%err, "failed to fetch newest tokens");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/tokens/:address - single registry entry
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    match Token::find_by_address(&address.to_lowercase(), &state.db_pool).await {
        Ok(Some(token)) => Json(TokenItem::from(token)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(%err, %address, "failed to fetch token");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
