//! Blizzard API response types
//!
//! These types mirror the game data API responses and are converted
//! to servana-core types for use by the services.

use serde::Deserialize;
use servana_core::{AuctionListing, Copper};

/// Response from POST oauth.battle.net/token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Response from GET /data/wow/item/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse {
    pub id: u64,

    /// Localized name (a plain string when a locale is requested)
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from GET /data/wow/media/item/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct ItemMediaResponse {
    #[serde(default)]
    pub assets: Vec<MediaAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    pub key: String,
    pub value: String,
}

impl ItemMediaResponse {
    /// URL of the first asset keyed `icon`
    pub fn icon_url(&self) -> Option<String> {
        self.assets
            .iter()
            .find(|a| a.key == "icon")
            .map(|a| a.value.clone())
    }
}

/// Response from GET /data/wow/connected-realm/{id}/auctions
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionsResponse {
    #[serde(default)]
    pub auctions: Vec<BlizzardAuction>,
}

/// A single auction from the listing
#[derive(Debug, Clone, Deserialize)]
pub struct BlizzardAuction {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub item: Option<AuctionItem>,

    /// Buyout in copper, absent for bid-only auctions
    #[serde(default)]
    pub buyout: Option<u64>,

    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionItem {
    #[serde(default)]
    pub id: Option<u64>,
}

impl BlizzardAuction {
    /// Convert to servana-core AuctionListing
    pub fn to_listing(&self) -> AuctionListing {
        AuctionListing {
            item_id: self.item.as_ref().and_then(|i| i.id),
            buyout: self.buyout.map(Copper),
            quantity: self.quantity,
        }
    }
}
