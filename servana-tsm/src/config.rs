//! TradeSkillMaster API configuration

use servana_core::{ServanaError, ServanaResult};
use std::env;
use std::time::Duration;

const DEFAULT_TOKEN_URL: &str = "https://auth.tradeskillmaster.com/oauth2/token";
const DEFAULT_PRICING_URL: &str = "https://pricing-api.tradeskillmaster.com";
const DEFAULT_REGION_ID: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint settings for the pricing API
#[derive(Clone)]
pub struct TsmConfig {
    pub client_id: String,
    pub api_key: String,
    /// TSM region id (1 = North America)
    pub region_id: u32,
    pub token_url: String,
    pub pricing_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl TsmConfig {
    pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            region_id: DEFAULT_REGION_ID,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            pricing_url: DEFAULT_PRICING_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expects:
    /// - TSM_CLIENT_ID / TSM_API_KEY: application id and user API key
    /// - TSM_REGION_ID: optional, defaults to 1
    /// - HTTP_TIMEOUT_SECS: optional, defaults to 30
    pub fn from_env() -> ServanaResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> ServanaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ServanaError::config(format!("{} must be set", key)))
        };

        let mut config = Self::new(required("TSM_CLIENT_ID")?, required("TSM_API_KEY")?);

        if let Some(raw) = lookup("TSM_REGION_ID") {
            config.region_id = raw.parse().map_err(|_| {
                ServanaError::config(format!("TSM_REGION_ID is not a number: {}", raw))
            })?;
        }

        if let Some(raw) = lookup("HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ServanaError::config(format!("HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl std::fmt::Debug for TsmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsmConfig")
            .field("client_id", &self.client_id)
            .field("region_id", &self.region_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
