//! Blizzard API configuration

use servana_core::{ServanaError, ServanaResult};
use std::env;
use std::time::Duration;

const DEFAULT_OAUTH_URL: &str = "https://oauth.battle.net/token";
const DEFAULT_REGION: &str = "us";
const DEFAULT_LOCALE: &str = "en_US";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint settings for the game data API
#[derive(Clone)]
pub struct BlizzardConfig {
    pub client_id: String,
    pub client_secret: String,
    /// API region (us, eu, kr, tw)
    pub region: String,
    pub locale: String,
    pub oauth_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl BlizzardConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            region: DEFAULT_REGION.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expects:
    /// - BLIZZARD_CLIENT_ID / BLIZZARD_CLIENT_SECRET: OAuth client credentials
    /// - BLIZZARD_REGION: optional, defaults to `us`
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

        let mut config = Self::new(
            required("BLIZZARD_CLIENT_ID")?,
            required("BLIZZARD_CLIENT_SECRET")?,
        );

        if let Some(region) = lookup("BLIZZARD_REGION").filter(|r| !r.is_empty()) {
            config.region = region.to_lowercase();
        }

        if let Some(raw) = lookup("HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ServanaError::config(format!("HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Regional API host, e.g. `https://us.api.blizzard.com`
    pub fn api_base_url(&self) -> String {
        format!("https://{}.api.blizzard.com", self.region)
    }

    /// Namespace for static data (items, media)
    pub fn static_namespace(&self) -> String {
        format!("static-{}", self.region)
    }

    /// Namespace for dynamic data (auctions, realms)
    pub fn dynamic_namespace(&self) -> String {
        format!("dynamic-{}", self.region)
    }
}

impl std::fmt::Debug for BlizzardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlizzardConfig")
            .field("client_id", &self.client_id)
            .field("region", &self.region)
            .field("locale", &self.locale)
            .field("timeout", &self.timeout)
            .finish()
    }
}
