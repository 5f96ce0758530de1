//! Price Comparison
//!
//! Puts an item's region market value next to the cached lowest ask on every
//! selected realm. Comparison only reads snapshots; refreshing them is the
//! coordinator's job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use servana_core::{
    Copper, Item, ItemId, MarketRegistry, MarketStat, RealmId, ServanaResult,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::item_details::{CacheFillReport, ItemDetails};
use crate::market_stats::MarketStatFetcher;
use crate::price_fetcher::PriceFetcher;

/// How a realm's lowest ask relates to the market value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceVerdict {
    Overpriced,
    Undercut,
    AtMarket,
    /// No listing or no market value
    Unknown,
}

impl PriceVerdict {
    pub fn from_diff(diff_percent: Option<f64>) -> Self {
        match diff_percent {
            Some(d) if d > 0.0 => PriceVerdict::Overpriced,
            Some(d) if d < 0.0 => PriceVerdict::Undercut,
            Some(_) => PriceVerdict::AtMarket,
            None => PriceVerdict::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RealmPriceRow {
    pub realm_id: RealmId,
    pub realm_name: String,
    pub lowest_ask: Option<Copper>,
    /// Lowest ask rendered as gold/silver/copper
    pub lowest_ask_display: String,
    /// Units listed on the realm; `None` if never refreshed
    pub quantity: Option<u64>,
    /// When the realm snapshot was taken; `None` if never refreshed
    pub refreshed_at: Option<DateTime<Utc>>,
    pub diff_percent: Option<f64>,
    pub verdict: PriceVerdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceComparison {
    pub item: Item,
    pub stat: MarketStat,
    pub market_value_display: String,
    pub rows: Vec<RealmPriceRow>,
}

pub struct PriceComparisonService {
    details: Arc<ItemDetails>,
    stats: Arc<MarketStatFetcher>,
    prices: Arc<PriceFetcher>,
    registry: Arc<dyn MarketRegistry>,
}

impl PriceComparisonService {
    pub fn new(
        details: Arc<ItemDetails>,
        stats: Arc<MarketStatFetcher>,
        prices: Arc<PriceFetcher>,
        registry: Arc<dyn MarketRegistry>,
    ) -> Self {
        Self {
            details,
            stats,
            prices,
            registry,
        }
    }

    /// Compare an item's cached realm prices against its market value
    #[instrument(skip(self))]
    pub async fn compare(&self, item_id: ItemId) -> ServanaResult<PriceComparison> {
        let item = self.details.get_item(item_id).await?;
        let stat = self.stats.get_stats(item_id).await?;

        let mut rows = Vec::new();
        for realm in self.registry.selected_realms()? {
            let snapshot = self.prices.cached_snapshot(realm.id)?;
            let lowest_ask = snapshot.as_ref().and_then(|s| s.price(item_id));
            let diff_percent = match (lowest_ask, stat.market_value) {
                (Some(ask), Some(mv)) => ask.percent_diff(mv),
                _ => None,
            };

            rows.push(RealmPriceRow {
                realm_id: realm.id,
                realm_name: realm.name,
                lowest_ask,
                lowest_ask_display: Copper::display_opt(lowest_ask),
                quantity: snapshot.as_ref().map(|s| s.quantity(item_id)),
                refreshed_at: snapshot.map(|s| s.refreshed_at),
                diff_percent,
                verdict: PriceVerdict::from_diff(diff_percent),
            });
        }
        rows.sort_by(|a, b| a.realm_name.cmp(&b.realm_name));

        debug!("Compared item {} across {} realms", item_id, rows.len());

        Ok(PriceComparison {
            item,
            market_value_display: Copper::display_opt(stat.market_value),
            stat,
            rows,
        })
    }

    /// Cache names and icons for everything listed on the selected realms
    ///
    /// Works from cached snapshots only, so realms should be refreshed first.
    #[instrument(skip(self))]
    pub async fn fill_item_cache(&self) -> ServanaResult<CacheFillReport> {
        let realm_ids = self.registry.selected_realm_ids()?;
        let item_ids = self.prices.cached_item_ids(&realm_ids)?;
        debug!(
            "Filling item cache from {} realms, {} items",
            realm_ids.len(),
            item_ids.len()
        );

        Ok(self.details.fill_cache(item_ids).await)
    }

    /// Search cached item names by name or id substring, ordered by id
    pub fn search_cached_items(&self, query: &str, limit: usize) -> ServanaResult<Vec<Item>> {
        let needle = query.trim().to_lowercase();

        let mut matches: Vec<(ItemId, String)> = self
            .details
            .cached_names()?
            .into_iter()
            .filter(|(id, name)| {
                needle.is_empty()
                    || name.to_lowercase().contains(&needle)
                    || id.to_string().contains(&needle)
            })
            .collect();
        matches.sort_by_key(|(id, _)| *id);
        matches.truncate(limit);

        matches
            .into_iter()
            .map(|(id, name)| -> ServanaResult<Item> {
                Ok(Item {
                    id,
                    name,
                    icon_url: self.details.cached_icon(id)?,
                })
            })
            .collect()
    }
}
