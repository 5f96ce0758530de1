//! TradeSkillMaster pricing API client

use async_trait::async_trait;
use reqwest::Client;
use servana_core::{ItemId, MarketStat, PricingApi, ServanaError, ServanaResult};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::TsmAuth;
use crate::config::TsmConfig;
use crate::types::RegionItemStats;

const SERVICE: &str = "TradeSkillMaster";

/// TradeSkillMaster pricing API client
#[derive(Clone)]
pub struct TsmClient {
    client: Client,
    config: Arc<TsmConfig>,
}

impl TsmClient {
    /// Create a new client; every request is bounded by `config.timeout`
    pub fn new(config: TsmConfig) -> ServanaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServanaError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn region_id(&self) -> u32 {
        self.config.region_id
    }

    /// API-key exchange sharing this client's connection pool
    pub fn auth(&self) -> TsmAuth {
        TsmAuth::new(self.client.clone(), Arc::clone(&self.config))
    }
}

#[async_trait]
impl PricingApi for TsmClient {
    #[instrument(skip(self, token))]
    async fn region_item_stats(&self, token: &str, item_id: ItemId) -> ServanaResult<MarketStat> {
        let url = format!(
            "{}/region/{}/item/{}",
            self.config.pricing_url, self.config.region_id, item_id
        );

        debug!("Fetching TSM region stats: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServanaError::timeout(format!("{} stats for item {}", SERVICE, item_id))
                } else {
                    ServanaError::network(format!("Failed to fetch TSM stats: {}", e))
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            404 => {
                return Err(ServanaError::not_found(format!(
                    "{} has no stats for item {}",
                    SERVICE, item_id
                )))
            }
            429 => return Err(ServanaError::rate_limited(SERVICE)),
            401 | 403 => {
                return Err(ServanaError::auth(format!(
                    "{} rejected the bearer token",
                    SERVICE
                )))
            }
            _ => {}
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServanaError::remote(
                status.as_u16(),
                format!("{} API error: {}", SERVICE, body),
            ));
        }

        let stats: RegionItemStats = response
            .json()
            .await
            .map_err(|e| ServanaError::parse(format!("Failed to parse TSM stats: {}", e)))?;

        Ok(stats.to_market_stat(item_id))
    }
}

impl std::fmt::Debug for TsmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsmClient")
            .field("pricing_url", &self.config.pricing_url)
            .field("region_id", &self.config.region_id)
            .finish()
    }
}
