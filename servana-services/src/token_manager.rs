//! Token Manager
//!
//! Holds one bearer token per provider and refreshes it shortly before it
//! expires. Concurrent callers that all find the token stale share a single
//! credential exchange: the check is repeated after taking the provider's
//! refresh lock.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use servana_core::{Provider, ServanaResult, Token, TokenExchange};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Refresh this many seconds before the provider-reported expiry
pub const REFRESH_MARGIN_SECS: i64 = 60;

struct ProviderSlot {
    exchange: Arc<dyn TokenExchange>,
    current: RwLock<Option<Token>>,
    /// Serializes exchanges for this provider
    refresh_lock: Mutex<()>,
}

impl ProviderSlot {
    fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    fn fresh_value(&self, now: DateTime<Utc>, margin: Duration) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .filter(|t| !t.needs_refresh(now, margin))
            .map(|t| t.value().to_string())
    }
}

/// Bearer tokens for the game data and pricing providers
pub struct TokenManager {
    game_data: ProviderSlot,
    market_pricing: ProviderSlot,
    margin: Duration,
}

impl TokenManager {
    /// Create a manager from the two provider-specific exchanges
    pub fn new(
        game_data: Arc<dyn TokenExchange>,
        market_pricing: Arc<dyn TokenExchange>,
    ) -> Self {
        debug_assert_eq!(game_data.provider(), Provider::GameData);
        debug_assert_eq!(market_pricing.provider(), Provider::MarketPricing);

        Self {
            game_data: ProviderSlot::new(game_data),
            market_pricing: ProviderSlot::new(market_pricing),
            margin: Duration::seconds(REFRESH_MARGIN_SECS),
        }
    }

    fn slot(&self, provider: Provider) -> &ProviderSlot {
        match provider {
            Provider::GameData => &self.game_data,
            Provider::MarketPricing => &self.market_pricing,
        }
    }

    /// Get a usable bearer value for `provider`, exchanging credentials if needed
    pub async fn get_token(&self, provider: Provider) -> ServanaResult<String> {
        self.get_token_at(provider, Utc::now()).await
    }

    /// Same as [`get_token`](Self::get_token) with an explicit clock reading
    pub async fn get_token_at(
        &self,
        provider: Provider,
        now: DateTime<Utc>,
    ) -> ServanaResult<String> {
        let slot = self.slot(provider);

        if let Some(value) = slot.fresh_value(now, self.margin) {
            return Ok(value);
        }

        let _guard = slot.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(value) = slot.fresh_value(now, self.margin) {
            debug!("{} token refreshed by a concurrent caller", provider);
            return Ok(value);
        }

        let issued = slot.exchange.exchange().await.map_err(|e| {
            warn!("{} credential exchange failed: {}", provider, e);
            e
        })?;

        let token = issued.into_token(provider, now).map_err(|e| {
            warn!("{} token rejected: {}", provider, e);
            e
        })?;
        info!("Obtained {} token, expires at {}", provider, token.expires_at);

        let value = token.value().to_string();
        *slot.current.write() = Some(token);

        Ok(value)
    }

    /// Drop the held token if it is still `rejected`, so the next request
    /// exchanges again
    ///
    /// A token already replaced by a concurrent refresh is kept.
    pub fn invalidate(&self, provider: Provider, rejected: &str) {
        let mut current = self.slot(provider).current.write();
        if current.as_ref().is_some_and(|t| t.value() == rejected) {
            *current = None;
            info!("Invalidated {} token", provider);
        } else {
            debug!("{} token already replaced, keeping it", provider);
        }
    }

    /// Expiry of the held token, if any
    pub fn expires_at(&self, provider: Provider) -> Option<DateTime<Utc>> {
        self.slot(provider)
            .current
            .read()
            .as_ref()
            .map(|t| t.expires_at)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("game_data_expires_at", &self.expires_at(Provider::GameData))
            .field(
                "market_pricing_expires_at",
                &self.expires_at(Provider::MarketPricing),
            )
            .finish()
    }
}
