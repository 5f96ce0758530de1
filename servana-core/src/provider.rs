//! Credential providers and the bearer tokens they issue

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ServanaError, ServanaResult};

/// Remote services that hand out bearer tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Blizzard game data API (items, media, auctions)
    GameData,
    /// TradeSkillMaster pricing API (region market value / sale rate)
    MarketPricing,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GameData, Provider::MarketPricing];

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::GameData => "Blizzard",
            Provider::MarketPricing => "TradeSkillMaster",
        }
    }

    /// Token lifetime assumed when the token endpoint omits `expires_in`
    pub fn default_lifetime(&self) -> Duration {
        match self {
            Provider::GameData => Duration::seconds(1800),
            Provider::MarketPricing => Duration::seconds(3600),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A bearer token issued by a provider
///
/// Replaced wholesale on refresh. `Debug` never prints the secret value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub provider: Provider,
    value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(provider: Provider, value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            provider,
            value: value.into(),
            expires_at,
        }
    }

    /// The opaque bearer value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when `now` is at or past `expires_at - margin`
    ///
    /// An expiry too close to the minimum representable time always needs
    /// refreshing.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at.checked_sub_signed(margin) {
            Some(refresh_at) => now >= refresh_at,
            None => true,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("provider", &self.provider)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Raw result of a credential exchange, before it is stamped into a [`Token`]
#[derive(Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds as reported by the provider
    pub expires_in: Option<i64>,
}

impl IssuedToken {
    /// Stamp the issued token relative to `issued_at`
    ///
    /// A negative or unrepresentable `expires_in` is an `Auth` error.
    pub fn into_token(self, provider: Provider, issued_at: DateTime<Utc>) -> ServanaResult<Token> {
        let lifetime = match self.expires_in {
            Some(secs) if secs < 0 => None,
            Some(secs) => Duration::try_seconds(secs),
            None => Some(provider.default_lifetime()),
        };

        let expires_at = lifetime
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ServanaError::auth(format!(
                    "{} returned an invalid token lifetime: {:?}",
                    provider, self.expires_in
                ))
            })?;

        Ok(Token::new(provider, self.access_token, expires_at))
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
