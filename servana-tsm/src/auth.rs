//! API-key token exchange for the pricing API

use async_trait::async_trait;
use reqwest::Client;
use servana_core::{IssuedToken, Provider, ServanaError, ServanaResult, TokenExchange};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::TsmConfig;
use crate::types::{TokenRequest, TokenResponse, TOKEN_SCOPE};

/// `api_token` grant against auth.tradeskillmaster.com
#[derive(Clone)]
pub struct TsmAuth {
    client: Client,
    config: Arc<TsmConfig>,
}

impl TsmAuth {
    pub(crate) fn new(client: Client, config: Arc<TsmConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TokenExchange for TsmAuth {
    fn provider(&self) -> Provider {
        Provider::MarketPricing
    }

    #[instrument(skip(self))]
    async fn exchange(&self) -> ServanaResult<IssuedToken> {
        debug!("Requesting TSM access token from {}", self.config.token_url);

        let body = TokenRequest {
            client_id: &self.config.client_id,
            grant_type: "api_token",
            scope: TOKEN_SCOPE,
            token: &self.config.api_key,
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServanaError::auth(format!("TSM token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServanaError::auth(format!(
                "TSM token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServanaError::auth(format!("Failed to parse TSM token response: {}", e)))?;

        Ok(IssuedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

impl std::fmt::Debug for TsmAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsmAuth")
            .field("token_url", &self.config.token_url)
            .finish()
    }
}
