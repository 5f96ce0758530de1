//! OAuth client-credentials exchange for the game data API

use async_trait::async_trait;
use reqwest::Client;
use servana_core::{IssuedToken, Provider, ServanaError, ServanaResult, TokenExchange};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::BlizzardConfig;
use crate::types::TokenResponse;

/// Client-credentials grant against oauth.battle.net
#[derive(Clone)]
pub struct BlizzardAuth {
    client: Client,
    config: Arc<BlizzardConfig>,
}

impl BlizzardAuth {
    pub(crate) fn new(client: Client, config: Arc<BlizzardConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TokenExchange for BlizzardAuth {
    fn provider(&self) -> Provider {
        Provider::GameData
    }

    #[instrument(skip(self))]
    async fn exchange(&self) -> ServanaResult<IssuedToken> {
        debug!("Requesting Blizzard access token from {}", self.config.oauth_url);

        let response = self
            .client
            .post(&self.config.oauth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ServanaError::auth(format!("Blizzard token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServanaError::auth(format!(
                "Blizzard token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ServanaError::auth(format!("Failed to parse Blizzard token response: {}", e))
        })?;

        Ok(IssuedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

impl std::fmt::Debug for BlizzardAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlizzardAuth")
            .field("oauth_url", &self.config.oauth_url)
            .finish()
    }
}
