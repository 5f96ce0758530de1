//! Blizzard game data API client
//!
//! Provides the item, media and auction endpoints the services need.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use servana_core::{
    AuctionListing, GameDataApi, ItemId, RealmId, ServanaError, ServanaResult,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::BlizzardAuth;
use crate::config::BlizzardConfig;
use crate::types::{AuctionsResponse, ItemMediaResponse, ItemResponse};

const SERVICE: &str = "Blizzard";

/// Blizzard game data API client
#[derive(Clone)]
pub struct BlizzardClient {
    client: Client,
    config: Arc<BlizzardConfig>,
    base_url: String,
}

impl BlizzardClient {
    /// Create a new client; every request is bounded by `config.timeout`
    pub fn new(config: BlizzardConfig) -> ServanaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServanaError::config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.api_base_url();

        Ok(Self {
            client,
            config: Arc::new(config),
            base_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential exchange sharing this client's connection pool
    pub fn auth(&self) -> BlizzardAuth {
        BlizzardAuth::new(self.client.clone(), Arc::clone(&self.config))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        namespace: &str,
        what: &str,
    ) -> ServanaResult<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!("Fetching Blizzard {}: {}", what, url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("namespace", namespace), ("locale", self.config.locale.as_str())])
            .send()
            .await
            .map_err(|e| send_error(e, what))?;

        let response = check_response(response, what).await?;

        response
            .json()
            .await
            .map_err(|e| ServanaError::parse(format!("Failed to parse {}: {}", what, e)))
    }
}

#[async_trait]
impl GameDataApi for BlizzardClient {
    #[instrument(skip(self, token))]
    async fn item_name(&self, token: &str, item_id: ItemId) -> ServanaResult<String> {
        let what = format!("item {}", item_id);
        let item: ItemResponse = self
            .get_json(
                token,
                &format!("/data/wow/item/{}", item_id),
                &self.config.static_namespace(),
                &what,
            )
            .await?;

        item.name
            .ok_or_else(|| ServanaError::parse(format!("Item {} has no name", item.id)))
    }

    #[instrument(skip(self, token))]
    async fn item_icon(&self, token: &str, item_id: ItemId) -> ServanaResult<Option<String>> {
        let what = format!("media for item {}", item_id);
        let media: ItemMediaResponse = self
            .get_json(
                token,
                &format!("/data/wow/media/item/{}", item_id),
                &self.config.static_namespace(),
                &what,
            )
            .await?;

        Ok(media.icon_url())
    }

    #[instrument(skip(self, token))]
    async fn realm_auctions(
        &self,
        token: &str,
        realm_id: RealmId,
    ) -> ServanaResult<Vec<AuctionListing>> {
        let what = format!("auctions for connected realm {}", realm_id);
        let response: AuctionsResponse = self
            .get_json(
                token,
                &format!("/data/wow/connected-realm/{}/auctions", realm_id),
                &self.config.dynamic_namespace(),
                &what,
            )
            .await?;

        debug!(
            "Connected realm {} returned {} auctions",
            realm_id,
            response.auctions.len()
        );

        Ok(response.auctions.iter().map(|a| a.to_listing()).collect())
    }
}

impl std::fmt::Debug for BlizzardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlizzardClient")
            .field("base_url", &self.base_url)
            .field("region", &self.config.region)
            .finish()
    }
}

/// Map a transport failure, keeping timeouts distinguishable
pub(crate) fn send_error(e: reqwest::Error, what: &str) -> ServanaError {
    if e.is_timeout() {
        ServanaError::timeout(format!("{} {}", SERVICE, what))
    } else {
        ServanaError::network(format!("Failed to fetch {}: {}", what, e))
    }
}

/// Turn a non-2xx response into the matching error
pub(crate) async fn check_response(response: Response, what: &str) -> ServanaResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        404 => Err(ServanaError::not_found(format!("{} {}", SERVICE, what))),
        429 => Err(ServanaError::rate_limited(SERVICE)),
        401 | 403 => Err(ServanaError::auth(format!(
            "{} rejected the bearer token for {}",
            SERVICE, what
        ))),
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(ServanaError::remote(
                code,
                format!("{} API error for {}: {}", SERVICE, what, body),
            ))
        }
    }
}
