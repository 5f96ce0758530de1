//! Item metadata and region-wide market statistics

use serde::{Deserialize, Serialize};

use crate::price::Copper;

/// Game item identifier
pub type ItemId = u64;

/// An item with its display metadata
///
/// Names and icons never change upstream, so cached items are permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Aggregate market statistics for an item across a region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketStat {
    pub item_id: ItemId,
    /// Externally computed market value in copper
    pub market_value: Option<Copper>,
    /// Fraction of stock historically sold, in [0, 1]
    pub sale_rate: Option<f64>,
}

impl MarketStat {
    /// The "no stat available" outcome
    pub fn absent(item_id: ItemId) -> Self {
        Self {
            item_id,
            market_value: None,
            sale_rate: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.market_value.is_none() && self.sale_rate.is_none()
    }

    /// Sale rate clamped into [0, 1]
    pub fn with_clamped_sale_rate(mut self) -> Self {
        self.sale_rate = self.sale_rate.map(|r| r.clamp(0.0, 1.0));
        self
    }
}
