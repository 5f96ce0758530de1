//! Business logic services for the Servana auction price checker
//!
//! This crate owns the stateful pieces: bearer tokens, the per-namespace
//! durable caches, realm price snapshots, region market stats, item details,
//! the concurrent realm refresh and the cross-realm price comparison.

pub mod item_details;
pub mod keyed_cache;
pub mod market_stats;
pub mod price_comparison;
pub mod price_fetcher;
pub mod realm_registry;
pub mod refresh_coordinator;
pub mod token_manager;

#[cfg(test)]
mod testing;

pub use item_details::{CacheFillReport, FailedItem, ItemDetails};
pub use keyed_cache::{namespaces, CacheError, Entries, KeyedCache};
pub use market_stats::MarketStatFetcher;
pub use price_comparison::{PriceComparison, PriceComparisonService, PriceVerdict, RealmPriceRow};
pub use price_fetcher::PriceFetcher;
pub use realm_registry::{parse_realm_list, CsvRealmRegistry};
pub use refresh_coordinator::{
    FailedRealm, RefreshCoordinator, RefreshFailure, RefreshReport, RefreshSummary,
    RefreshedRealm,
};
pub use token_manager::{TokenManager, REFRESH_MARGIN_SECS};
