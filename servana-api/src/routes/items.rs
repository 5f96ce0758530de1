//! Item endpoints: details, market stats, cross-realm comparison, search

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use servana_core::{Item, ItemId, MarketStat};
use servana_services::{CacheFillReport, PriceComparison};
use tracing::info;

use super::ApiResult;
use crate::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Query parameters for searching cached items
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
    pub count: usize,
}

/// Create item routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(search_items))
        .route("/items/fill-cache", post(fill_cache))
        .route("/items/{id}", get(get_item))
        .route("/items/{id}/stats", get(get_stats))
        .route("/items/{id}/compare", get(compare_item))
}

/// Search items whose names are already cached
async fn search_items(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<ItemsResponse> {
    let query = params.search.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let items = state.comparison.search_cached_items(&query, limit)?;
    Ok(Json(ItemsResponse {
        count: items.len(),
        items,
    }))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<ItemId>) -> ApiResult<Item> {
    Ok(Json(state.details.get_item(id).await?))
}

async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<MarketStat> {
    Ok(Json(state.stats.get_stats(id).await?))
}

async fn compare_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<PriceComparison> {
    info!("Comparing item {} across selected realms", id);
    Ok(Json(state.comparison.compare(id).await?))
}

/// Cache names and icons for every item listed on the selected realms
async fn fill_cache(State(state): State<AppState>) -> ApiResult<CacheFillReport> {
    info!("Filling item cache from selected realms");
    Ok(Json(state.comparison.fill_item_cache().await?))
}
