//! Market Stat Fetcher
//!
//! Region-wide market value and sale rate per item, cache first. An item the
//! pricing API has never seen is cached as an absent stat so it is not asked
//! about again.

use servana_core::{ItemId, MarketStat, PricingApi, Provider, ServanaError, ServanaResult};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::keyed_cache::KeyedCache;
use crate::token_manager::TokenManager;

pub struct MarketStatFetcher {
    tokens: Arc<TokenManager>,
    pricing: Arc<dyn PricingApi>,
    stats: Arc<KeyedCache<MarketStat>>,
}

impl MarketStatFetcher {
    pub fn new(
        tokens: Arc<TokenManager>,
        pricing: Arc<dyn PricingApi>,
        stats: Arc<KeyedCache<MarketStat>>,
    ) -> Self {
        Self {
            tokens,
            pricing,
            stats,
        }
    }

    /// Market value and sale rate for an item
    #[instrument(skip(self))]
    pub async fn get_stats(&self, item_id: ItemId) -> ServanaResult<MarketStat> {
        let key = item_id.to_string();

        if let Some(stat) = self.stats.lookup(&key)? {
            debug!("Market stat cache hit for item {}", item_id);
            return Ok(stat);
        }

        let token = self.tokens.get_token(Provider::MarketPricing).await?;

        let stat = match self.pricing.region_item_stats(&token, item_id).await {
            Ok(stat) => stat.with_clamped_sale_rate(),
            Err(ServanaError::NotFound(_)) => {
                debug!("No pricing data for item {}, caching absent stat", item_id);
                MarketStat::absent(item_id)
            }
            Err(e) => {
                if matches!(e, ServanaError::Auth(_)) {
                    self.tokens.invalidate(Provider::MarketPricing, &token);
                }
                warn!("Failed to fetch market stat for item {}: {}", item_id, e);
                return Err(e);
            }
        };

        self.stats.put(&key, &stat)?;
        Ok(stat)
    }

    /// Cached stat without touching the network
    pub fn cached_stats(&self, item_id: ItemId) -> ServanaResult<Option<MarketStat>> {
        Ok(self.stats.lookup(&item_id.to_string())?)
    }
}
