//! TradeSkillMaster API request and response types

use serde::{Deserialize, Serialize};
use servana_core::{Copper, ItemId, MarketStat};

/// Scopes requested for the API-key grant
pub const TOKEN_SCOPE: &str = "app:realm-api app:pricing-api";

/// Body of POST auth.tradeskillmaster.com/oauth2/token
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub grant_type: &'a str,
    pub scope: &'a str,
    pub token: &'a str,
}

/// Response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Response from GET /region/{regionId}/item/{itemId}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionItemStats {
    /// Region market value in copper
    #[serde(default)]
    pub market_value: Option<u64>,

    /// Fraction of listed stock that sells
    #[serde(default)]
    pub sale_rate: Option<f64>,
}

impl RegionItemStats {
    /// Convert to servana-core MarketStat
    pub fn to_market_stat(&self, item_id: ItemId) -> MarketStat {
        MarketStat {
            item_id,
            market_value: self.market_value.map(Copper),
            sale_rate: self.sale_rate,
        }
        .with_clamped_sale_rate()
    }
}
