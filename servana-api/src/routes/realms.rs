//! Realm endpoints: registry, cached prices, coordinated refresh

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use servana_core::{Copper, ItemId, Realm, RealmId};
use servana_services::RefreshSummary;
use tracing::info;

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RealmsResponse {
    pub realms: Vec<Realm>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CachedPriceResponse {
    pub realm_id: RealmId,
    pub item_id: ItemId,
    pub price: Option<Copper>,
    pub display: String,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Create realm routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/realms", get(list_realms))
        .route("/realms/refresh", post(refresh_realms))
        .route("/realms/{id}", put(set_enabled))
        .route("/realms/{id}/prices/{item}", get(cached_price))
}

async fn list_realms(State(state): State<AppState>) -> ApiResult<RealmsResponse> {
    let realms = state.registry.all()?;
    Ok(Json(RealmsResponse {
        count: realms.len(),
        realms,
    }))
}

async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<RealmId>,
    Json(body): Json<SetEnabledRequest>,
) -> ApiResult<Realm> {
    Ok(Json(state.registry.set_enabled(id, body.enabled)?))
}

/// Lowest cached ask; never fetches
async fn cached_price(
    State(state): State<AppState>,
    Path((realm_id, item_id)): Path<(RealmId, ItemId)>,
) -> ApiResult<CachedPriceResponse> {
    let snapshot = state.prices.cached_snapshot(realm_id)?;
    let price = snapshot.as_ref().and_then(|s| s.price(item_id));

    Ok(Json(CachedPriceResponse {
        realm_id,
        item_id,
        price,
        display: Copper::display_opt(price),
        refreshed_at: snapshot.map(|s| s.refreshed_at),
    }))
}

/// Refresh every selected realm; partial failures are part of the response
async fn refresh_realms(State(state): State<AppState>) -> ApiResult<RefreshSummary> {
    info!("Refreshing selected realms");
    let report = state
        .coordinator
        .refresh_registry(state.registry.as_ref())
        .await?;
    Ok(Json(report.summary()))
}
