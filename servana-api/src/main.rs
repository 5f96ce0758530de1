//! Servana API Server
//!
//! HTTP API server that compares auction house prices across connected
//! realms against TradeSkillMaster region market values.

mod config;
mod routes;

use anyhow::Context;
use axum::{
    http::{header, Method},
    Router,
};
use servana_blizzard::{BlizzardClient, BlizzardConfig};
use servana_core::MarketRegistry;
use servana_services::{
    namespaces, CsvRealmRegistry, ItemDetails, KeyedCache, MarketStatFetcher,
    PriceComparisonService, PriceFetcher, RefreshCoordinator, TokenManager,
};
use servana_tsm::{TsmClient, TsmConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenManager>,
    pub details: Arc<ItemDetails>,
    pub stats: Arc<MarketStatFetcher>,
    pub prices: Arc<PriceFetcher>,
    pub coordinator: Arc<RefreshCoordinator>,
    pub registry: Arc<CsvRealmRegistry>,
    pub comparison: Arc<PriceComparisonService>,
}

/// Wire clients, caches and services together
fn build_state(
    server: &ServerConfig,
    blizzard: BlizzardConfig,
    tsm: TsmConfig,
) -> anyhow::Result<AppState> {
    let blizzard = Arc::new(BlizzardClient::new(blizzard)?);
    let tsm = Arc::new(TsmClient::new(tsm)?);

    let tokens = Arc::new(TokenManager::new(
        Arc::new(blizzard.auth()),
        Arc::new(tsm.auth()),
    ));

    let dir = &server.cache_dir;
    info!("Opening caches in {:?}", dir);
    let names = Arc::new(KeyedCache::open(dir, namespaces::ITEM_NAMES)?);
    let icons = Arc::new(KeyedCache::open(dir, namespaces::ITEM_ICONS)?);
    let market_stats = Arc::new(KeyedCache::open(dir, namespaces::MARKET_STATS)?);
    let auction_prices = Arc::new(KeyedCache::open(dir, namespaces::AUCTION_PRICES)?);
    let realm_settings = Arc::new(KeyedCache::open(dir, namespaces::REALM_SETTINGS)?);

    let details = Arc::new(ItemDetails::new(
        tokens.clone(),
        blizzard.clone(),
        names,
        icons,
    ));
    let stats = Arc::new(MarketStatFetcher::new(tokens.clone(), tsm, market_stats));
    let prices = Arc::new(PriceFetcher::new(
        tokens.clone(),
        blizzard,
        auction_prices,
    ));
    let coordinator = Arc::new(RefreshCoordinator::new(prices.clone()));

    let registry = Arc::new(CsvRealmRegistry::new(
        server.realms_csv.clone(),
        realm_settings,
    ));
    let comparison = Arc::new(PriceComparisonService::new(
        details.clone(),
        stats.clone(),
        prices.clone(),
        registry.clone(),
    ));

    Ok(AppState {
        tokens,
        details,
        stats,
        prices,
        coordinator,
        registry,
        comparison,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local, then .env
    for file in [".env.local", ".env"] {
        if let Err(e) = dotenvy::from_filename(file) {
            // Not an error if the file doesn't exist
            if !matches!(e, dotenvy::Error::Io(_)) {
                eprintln!("Warning: Failed to load {}: {}", file, e);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,servana_api=debug")),
        )
        .init();

    info!("Starting Servana API");

    let server = ServerConfig::from_env()?;
    let blizzard = BlizzardConfig::from_env().context("Blizzard credentials")?;
    let tsm = TsmConfig::from_env().context("TradeSkillMaster credentials")?;
    info!(
        "Blizzard region {}, TSM region {}",
        blizzard.region, tsm.region_id
    );

    let state = build_state(&server, blizzard, tsm)?;

    let selected = state.registry.selected_realm_ids()?;
    info!(
        "Realm list {:?}: {} realms selected",
        state.registry.path(),
        selected.len()
    );

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
