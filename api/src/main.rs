//! CypherX Registry API
//!
//! Read-only REST endpoints over the token registry for the frontend.

use std::{env, net::SocketAddr, sync::Arc};

use axum::{routing::get, Json, Router};
use sqlx::{Pool, Postgres};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Pool<Postgres>,
}

mod defaults {
    pub const API_PORT: &str = "8080";
    pub const API_HOST: &str = "0.0.0.0";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CypherX Registry API...");

    let db_pool = registry_db::initialize_database().await?;
    tracing::info!("Connected to database");

    let state = Arc::new(AppState { db_pool });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes())
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let port = env::var("API_PORT")
        .unwrap_or_else(|_| defaults::API_PORT.to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    let host = env::var("API_HOST").unwrap_or_else(|_| defaults::API_HOST.to_string());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Root endpoint - API information
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "CypherX Registry API",
        "endpoints": [
            "GET /health",
            "GET /api/tokens/new",
            "GET /api/tokens/:address",
            "GET /api/pairs/recent",
        ]
    }))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
