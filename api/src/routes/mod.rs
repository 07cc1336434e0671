//! API route definitions

pub mod pairs;
pub mod tokens;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens/new", get(tokens::get_new_tokens))
        .route("/tokens/:address", get(tokens::get_token))
        .route("/pairs/recent", get(pairs::get_recent_pairs))
}
