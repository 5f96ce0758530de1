//! Seams between the services and the remote collaborators
//!
//! The HTTP adapters in `servana-blizzard` and `servana-tsm` implement these;
//! tests substitute counting fakes.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::ServanaResult;
use crate::item::{ItemId, MarketStat};
use crate::market::{AuctionListing, Realm, RealmId};
use crate::provider::{IssuedToken, Provider};

/// A provider-specific credential exchange
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Which provider this exchange talks to
    fn provider(&self) -> Provider;

    /// Perform one credential exchange
    ///
    /// Any failure (transport, rejected credentials, non-2xx) is reported as
    /// [`ServanaError::Auth`](crate::ServanaError::Auth).
    async fn exchange(&self) -> ServanaResult<IssuedToken>;
}

/// Game data endpoints consumed by the services
#[async_trait]
pub trait GameDataApi: Send + Sync {
    /// Localized item name
    async fn item_name(&self, token: &str, item_id: ItemId) -> ServanaResult<String>;

    /// Icon URL from the item's media assets, `None` when the item has no icon
    async fn item_icon(&self, token: &str, item_id: ItemId) -> ServanaResult<Option<String>>;

    /// Full auction listing of a connected realm
    async fn realm_auctions(
        &self,
        token: &str,
        realm_id: RealmId,
    ) -> ServanaResult<Vec<AuctionListing>>;
}

/// Pricing endpoints consumed by the services
#[async_trait]
pub trait PricingApi: Send + Sync {
    /// Region-wide stats for an item; a 404 is reported as `NotFound`
    async fn region_item_stats(&self, token: &str, item_id: ItemId) -> ServanaResult<MarketStat>;
}

/// Supplies the realms the user currently compares prices across
pub trait MarketRegistry: Send + Sync {
    /// Enabled realms
    fn selected_realms(&self) -> ServanaResult<Vec<Realm>>;

    fn selected_realm_ids(&self) -> ServanaResult<BTreeSet<RealmId>> {
        Ok(self.selected_realms()?.into_iter().map(|r| r.id).collect())
    }
}
