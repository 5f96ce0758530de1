//! Realms, auction listings and lowest-ask snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::item::ItemId;
use crate::price::Copper;

/// Connected realm identifier
pub type RealmId = u32;

/// A realm known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    pub id: RealmId,
    pub name: String,
    pub enabled: bool,
}

/// One entry of a realm's auction listing
///
/// Fields are optional because the upstream listing is not uniform;
/// commodity entries carry a unit price instead of a buyout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuctionListing {
    pub item_id: Option<ItemId>,
    pub buyout: Option<Copper>,
    pub quantity: Option<u64>,
}

/// Lowest asking price per item for one realm, as of one refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPriceSnapshot {
    pub realm_id: RealmId,
    pub prices: BTreeMap<ItemId, Copper>,
    /// Units listed per item across all of the realm's entries
    #[serde(default)]
    pub quantities: BTreeMap<ItemId, u64>,
    pub refreshed_at: DateTime<Utc>,
}

impl MarketPriceSnapshot {
    /// Fold a listing into lowest-ask-per-item
    ///
    /// Entries without an item id or buyout are skipped. The fold is a
    /// commutative minimum, so listing order does not matter.
    pub fn from_listings<I>(realm_id: RealmId, listings: I, refreshed_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = AuctionListing>,
    {
        let mut prices: BTreeMap<ItemId, Copper> = BTreeMap::new();
        let mut quantities: BTreeMap<ItemId, u64> = BTreeMap::new();

        for listing in listings {
            let Some(item_id) = listing.item_id else {
                continue;
            };
            *quantities.entry(item_id).or_default() += listing.quantity.unwrap_or(0);

            let Some(buyout) = listing.buyout else {
                continue;
            };
            prices
                .entry(item_id)
                .and_modify(|lowest| *lowest = (*lowest).min(buyout))
                .or_insert(buyout);
        }

        Self {
            realm_id,
            prices,
            quantities,
            refreshed_at,
        }
    }

    /// Lowest ask for an item, if listed
    pub fn price(&self, item_id: ItemId) -> Option<Copper> {
        self.prices.get(&item_id).copied()
    }

    /// Every item that appeared in the listing, priced or not
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.prices.keys().chain(self.quantities.keys()).copied()
    }

    /// Units listed for an item, zero if none
    pub fn quantity(&self, item_id: ItemId) -> u64 {
        self.quantities.get(&item_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
