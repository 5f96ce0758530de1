//! Price Fetcher
//!
//! Pulls a realm's full auction listing, reduces it to the lowest buyout per
//! item and stores the result as that realm's snapshot. Reads never touch
//! the network.

use chrono::Utc;
use servana_core::{
    Copper, GameDataApi, ItemId, MarketPriceSnapshot, Provider, RealmId, ServanaError,
    ServanaResult,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::keyed_cache::KeyedCache;
use crate::token_manager::TokenManager;

pub struct PriceFetcher {
    tokens: Arc<TokenManager>,
    game_data: Arc<dyn GameDataApi>,
    prices: Arc<KeyedCache<MarketPriceSnapshot>>,
}

impl PriceFetcher {
    pub fn new(
        tokens: Arc<TokenManager>,
        game_data: Arc<dyn GameDataApi>,
        prices: Arc<KeyedCache<MarketPriceSnapshot>>,
    ) -> Self {
        Self {
            tokens,
            game_data,
            prices,
        }
    }

    /// Fetch a realm's listing and replace its cached snapshot
    ///
    /// On any error the previous snapshot is left untouched.
    #[instrument(skip(self))]
    pub async fn refresh_market(&self, realm_id: RealmId) -> ServanaResult<MarketPriceSnapshot> {
        let token = self.tokens.get_token(Provider::GameData).await?;

        let listings = match self.game_data.realm_auctions(&token, realm_id).await {
            Ok(listings) => listings,
            Err(e) => {
                if matches!(e, ServanaError::Auth(_)) {
                    self.tokens.invalidate(Provider::GameData, &token);
                }
                warn!("Failed to fetch auctions for realm {}: {}", realm_id, e);
                return Err(e);
            }
        };

        debug!("Realm {} returned {} auctions", realm_id, listings.len());

        let snapshot = MarketPriceSnapshot::from_listings(realm_id, listings, Utc::now());
        self.prices.put(&realm_id.to_string(), &snapshot)?;

        info!(
            "Refreshed realm {}: {} items priced",
            realm_id,
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Lowest cached ask for an item on a realm
    pub fn cached_price(&self, realm_id: RealmId, item_id: ItemId) -> ServanaResult<Option<Copper>> {
        Ok(self
            .cached_snapshot(realm_id)?
            .and_then(|snapshot| snapshot.price(item_id)))
    }

    pub fn cached_snapshot(&self, realm_id: RealmId) -> ServanaResult<Option<MarketPriceSnapshot>> {
        Ok(self.prices.lookup(&realm_id.to_string())?)
    }

    /// Distinct items listed in the cached snapshots of `realm_ids`
    ///
    /// Realms never refreshed contribute nothing.
    pub fn cached_item_ids(&self, realm_ids: &BTreeSet<RealmId>) -> ServanaResult<BTreeSet<ItemId>> {
        let mut item_ids = BTreeSet::new();
        for &realm_id in realm_ids {
            if let Some(snapshot) = self.cached_snapshot(realm_id)? {
                item_ids.extend(snapshot.item_ids());
            }
        }
        Ok(item_ids)
    }

    /// Every cached snapshot, in key order
    pub fn cached_snapshots(&self) -> ServanaResult<Vec<MarketPriceSnapshot>> {
        self.prices
            .entries()
            .map(|entry| entry.map(|(_, snapshot)| snapshot).map_err(ServanaError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyed_cache::namespaces;
    use crate::testing::{fake_tokens, listing, tokens_over, Failure, FakeExchange, FakeGameData};

    fn fetcher(game_data: FakeGameData) -> (PriceFetcher, Arc<FakeGameData>) {
        let game_data = Arc::new(game_data);
        let prices = Arc::new(KeyedCache::open_in_memory(namespaces::AUCTION_PRICES).unwrap());
        (
            PriceFetcher::new(fake_tokens(), game_data.clone(), prices),
            game_data,
        )
    }

    #[tokio::test]
    async fn test_refresh_keeps_lowest_buyout() {
        let (fetcher, _) = fetcher(FakeGameData::default().with_auctions(
            1146,
            vec![
                listing(19019, 5_000_000),
                listing(19019, 4_200_000),
                listing(2589, 120),
            ],
        ));

        let snapshot = fetcher.refresh_market(1146).await.unwrap();
        assert_eq!(snapshot.price(19019), Some(Copper(4_200_000)));

        assert_eq!(
            fetcher.cached_price(1146, 19019).unwrap(),
            Some(Copper(4_200_000))
        );
        assert_eq!(fetcher.cached_price(1146, 2589).unwrap(), Some(Copper(120)));
        assert_eq!(fetcher.cached_price(1146, 1).unwrap(), None);
    }

    #[tokio::test]
    async fn test_cached_price_for_unknown_realm_is_none() {
        let (fetcher, game_data) = fetcher(FakeGameData::default());

        assert_eq!(fetcher.cached_price(9999, 19019).unwrap(), None);
        assert_eq!(game_data.auction_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot_wholesale() {
        let (fetcher, _) =
            fetcher(FakeGameData::default().with_auctions(1, vec![listing(10, 100)]));
        fetcher.refresh_market(1).await.unwrap();

        // Same cache, new listing without item 10
        let game_data = Arc::new(FakeGameData::default().with_auctions(1, vec![listing(11, 50)]));
        let second = PriceFetcher::new(fake_tokens(), game_data, fetcher.prices.clone());
        second.refresh_market(1).await.unwrap();

        assert_eq!(second.cached_price(1, 10).unwrap(), None);
        assert_eq!(second.cached_price(1, 11).unwrap(), Some(Copper(50)));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_previous_snapshot() {
        let (fetcher, _) =
            fetcher(FakeGameData::default().with_auctions(1, vec![listing(10, 100)]));
        fetcher.refresh_market(1).await.unwrap();

        let failing = Arc::new(FakeGameData::default().with_realm_failure(1, Failure::Timeout));
        let second = PriceFetcher::new(fake_tokens(), failing, fetcher.prices.clone());

        let err = second.refresh_market(1).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(second.cached_price(1, 10).unwrap(), Some(Copper(100)));
    }

    #[tokio::test]
    async fn test_empty_listing_caches_empty_snapshot() {
        let (fetcher, _) = fetcher(FakeGameData::default().with_auctions(5, Vec::new()));

        let snapshot = fetcher.refresh_market(5).await.unwrap();
        assert!(snapshot.is_empty());
        assert!(fetcher.cached_snapshot(5).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cached_snapshots_lists_every_realm() {
        let (fetcher, _) = fetcher(
            FakeGameData::default()
                .with_auctions(1, vec![listing(10, 100)])
                .with_auctions(2, vec![listing(10, 90)]),
        );
        fetcher.refresh_market(1).await.unwrap();
        fetcher.refresh_market(2).await.unwrap();

        let mut realms: Vec<RealmId> = fetcher
            .cached_snapshots()
            .unwrap()
            .into_iter()
            .map(|s| s.realm_id)
            .collect();
        realms.sort();
        assert_eq!(realms, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cached_item_ids_unions_selected_realms() {
        let (fetcher, _) = fetcher(
            FakeGameData::default()
                .with_auctions(1, vec![listing(10, 100), listing(11, 5)])
                .with_auctions(2, vec![listing(11, 7), listing(12, 9)])
                .with_auctions(3, vec![listing(99, 1)]),
        );
        for realm_id in 1..=3 {
            fetcher.refresh_market(realm_id).await.unwrap();
        }

        let ids = fetcher.cached_item_ids(&BTreeSet::from([1, 2, 4])).unwrap();
        assert_eq!(ids, BTreeSet::from([10, 11, 12]));
    }

    fn counted(
        game: &Arc<FakeExchange>,
        game_data: FakeGameData,
    ) -> (PriceFetcher, Arc<FakeGameData>) {
        let pricing = FakeExchange::new(Provider::MarketPricing, Some(3600));
        let game_data = Arc::new(game_data);
        let prices = Arc::new(KeyedCache::open_in_memory(namespaces::AUCTION_PRICES).unwrap());
        (
            PriceFetcher::new(tokens_over(game, &pricing), game_data.clone(), prices),
            game_data,
        )
    }

    #[tokio::test]
    async fn test_rejected_token_is_exchanged_again() {
        let game = FakeExchange::new(Provider::GameData, Some(1800));
        let (fetcher, _) = counted(
            &game,
            FakeGameData::default().with_realm_failure(1, Failure::Auth),
        );

        let err = fetcher.refresh_market(1).await.unwrap_err();
        assert!(matches!(err, ServanaError::Auth(_)));
        assert_eq!(game.calls(), 1);

        let _ = fetcher.refresh_market(1).await;
        assert_eq!(game.calls(), 2);
        assert!(fetcher.cached_snapshot(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_keeps_token() {
        let game = FakeExchange::new(Provider::GameData, Some(1800));
        let (fetcher, _) = counted(
            &game,
            FakeGameData::default().with_realm_failure(1, Failure::Server),
        );

        assert!(fetcher.refresh_market(1).await.is_err());
        assert!(fetcher.refresh_market(1).await.is_err());
        assert_eq!(game.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_exchange_fetches_nothing() {
        let game = FakeExchange::failing(Provider::GameData);
        let (fetcher, game_data) = counted(
            &game,
            FakeGameData::default().with_auctions(1, vec![listing(10, 100)]),
        );

        let err = fetcher.refresh_market(1).await.unwrap_err();
        assert!(matches!(err, ServanaError::Auth(_)));
        assert_eq!(game_data.auction_calls(), 0);
        assert!(fetcher.cached_snapshot(1).unwrap().is_none());
    }
}
