//! Health check endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use servana_core::Provider;

use crate::AppState;

#[derive(Debug, Serialize)]
struct TokenHealth {
    provider: Provider,
    expires_at: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    tokens: Vec<TokenHealth>,
}

/// Which provider tokens are currently held
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tokens = Provider::ALL
        .iter()
        .map(|&provider| TokenHealth {
            provider,
            expires_at: state.tokens.expires_at(provider),
        })
        .collect();

    Json(HealthResponse {
        status: "healthy",
        tokens,
    })
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
