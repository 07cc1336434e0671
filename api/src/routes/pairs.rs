//! Pair API routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use registry_db::entity::pair::Pair;

use crate::{
    routes::tokens::{ListQuery, DEFAULT_LIMIT, MAX_LIMIT},
    AppState,
};

/// Pair response item
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairItem {
    pub address: String,
    pub token0: String,
    pub token1: String,
    pub factory: String,
    pub block_number: i64,
    pub created_at: String,
}

impl From<Pair> for PairItem {
    fn from(p: Pair) -> Self {
        Self {
            address: p.address,
            token0: p.token0_address,
            token1: p.token1_address,
            factory: p.factory_name,
            block_number: p.block_number,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/pairs/recent - newest discovered pairs
pub async fn get_recent_pairs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    match Pair::find_recent(limit, &state.db_pool).await {
        Ok(pairs) => {
            let items: Vec<PairItem> = pairs.into_iter().map(PairItem::from).collect();
            Json(items).into_response()
        }
        Err(err) => {
            tracing::error!(%err, "failed to fetch recent pairs");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
