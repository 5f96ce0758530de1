//! Item Details
//!
//! Item names and icon URLs from the game data API. Both are immutable
//! upstream, so a successful lookup is cached forever. Failures are never
//! cached.

use serde::Serialize;
use servana_core::{
    ErrorCategory, GameDataApi, Item, ItemId, Provider, ServanaError, ServanaResult,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::keyed_cache::KeyedCache;
use crate::token_manager::TokenManager;

/// Outcome of a bulk name and icon fill
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheFillReport {
    /// Distinct items considered
    pub items: usize,
    pub names_added: usize,
    pub icons_added: usize,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub item_id: ItemId,
    pub error: String,
    pub category: ErrorCategory,
}

pub struct ItemDetails {
    tokens: Arc<TokenManager>,
    game_data: Arc<dyn GameDataApi>,
    names: Arc<KeyedCache<String>>,
    icons: Arc<KeyedCache<Option<String>>>,
}

impl ItemDetails {
    pub fn new(
        tokens: Arc<TokenManager>,
        game_data: Arc<dyn GameDataApi>,
        names: Arc<KeyedCache<String>>,
        icons: Arc<KeyedCache<Option<String>>>,
    ) -> Self {
        Self {
            tokens,
            game_data,
            names,
            icons,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_item_name(&self, item_id: ItemId) -> ServanaResult<String> {
        let key = item_id.to_string();
        if let Some(name) = self.names.lookup(&key)? {
            return Ok(name);
        }

        let token = self.tokens.get_token(Provider::GameData).await?;
        let name = self
            .game_data
            .item_name(&token, item_id)
            .await
            .map_err(|e| self.on_remote_error(item_id, &token, e))?;

        debug!("Caching name for item {}: {}", item_id, name);
        self.names.put(&key, &name)?;
        Ok(name)
    }

    /// Icon URL, `Ok(None)` when the item has media but no icon asset
    #[instrument(skip(self))]
    pub async fn get_item_icon(&self, item_id: ItemId) -> ServanaResult<Option<String>> {
        let key = item_id.to_string();
        if let Some(icon) = self.icons.lookup(&key)? {
            return Ok(icon);
        }

        let token = self.tokens.get_token(Provider::GameData).await?;
        let icon = self
            .game_data
            .item_icon(&token, item_id)
            .await
            .map_err(|e| self.on_remote_error(item_id, &token, e))?;

        self.icons.put(&key, &icon)?;
        Ok(icon)
    }

    /// Name and icon together
    pub async fn get_item(&self, item_id: ItemId) -> ServanaResult<Item> {
        let name = self.get_item_name(item_id).await?;
        let icon_url = self.get_item_icon(item_id).await?;

        Ok(Item {
            id: item_id,
            name,
            icon_url,
        })
    }

    /// Cache the name and icon of every item that lacks one
    ///
    /// Items are looked up one at a time. A failed item is recorded and the
    /// fill moves on; nothing is cached for it.
    #[instrument(skip_all)]
    pub async fn fill_cache(&self, item_ids: BTreeSet<ItemId>) -> CacheFillReport {
        let mut report = CacheFillReport {
            items: item_ids.len(),
            ..Default::default()
        };

        for item_id in item_ids {
            if let Err(error) = self.fill_item(item_id, &mut report).await {
                report.failed.push(FailedItem {
                    item_id,
                    error: error.to_string(),
                    category: error.category(),
                });
            }
        }

        info!(
            "Cache fill over {} items: {} names, {} icons added, {} failed",
            report.items,
            report.names_added,
            report.icons_added,
            report.failed.len()
        );
        report
    }

    async fn fill_item(&self, item_id: ItemId, report: &mut CacheFillReport) -> ServanaResult<()> {
        let key = item_id.to_string();

        if !self.names.has(&key)? {
            self.get_item_name(item_id).await?;
            report.names_added += 1;
        }
        if !self.icons.has(&key)? {
            self.get_item_icon(item_id).await?;
            report.icons_added += 1;
        }
        Ok(())
    }

    /// Every item whose name has been cached
    pub fn cached_names(&self) -> ServanaResult<Vec<(ItemId, String)>> {
        let mut items = Vec::new();
        for entry in self.names.entries() {
            let (key, name) = entry?;
            match key.parse::<ItemId>() {
                Ok(id) => items.push((id, name)),
                Err(_) => warn!("Ignoring non-numeric item name key {:?}", key),
            }
        }
        Ok(items)
    }

    /// Cached icon without touching the network
    pub fn cached_icon(&self, item_id: ItemId) -> ServanaResult<Option<String>> {
        Ok(self.icons.lookup(&item_id.to_string())?.flatten())
    }

    fn on_remote_error(&self, item_id: ItemId, token: &str, e: ServanaError) -> ServanaError {
        if matches!(e, ServanaError::Auth(_)) {
            self.tokens.invalidate(Provider::GameData, token);
        }
        warn!("Failed to fetch details for item {}: {}", item_id, e);
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyed_cache::namespaces;
    use crate::testing::{fake_tokens, tokens_over, Failure, FakeExchange, FakeGameData};
    use std::sync::atomic::Ordering;

    fn details(game_data: FakeGameData) -> (ItemDetails, Arc<FakeGameData>) {
        let game_data = Arc::new(game_data);
        let details = ItemDetails::new(
            fake_tokens(),
            game_data.clone(),
            Arc::new(KeyedCache::open_in_memory(namespaces::ITEM_NAMES).unwrap()),
            Arc::new(KeyedCache::open_in_memory(namespaces::ITEM_ICONS).unwrap()),
        );
        (details, game_data)
    }

    #[tokio::test]
    async fn test_name_is_fetched_once() {
        let (details, game_data) = details(FakeGameData::default().with_item(
            19019,
            "Thunderfury, Blessed Blade of the Windseeker",
            Some("https://render.worldofwarcraft.com/us/icons/56/inv_sword_39.jpg"),
        ));

        let first = details.get_item_name(19019).await.unwrap();
        let second = details.get_item_name(19019).await.unwrap();

        assert_eq!(first, "Thunderfury, Blessed Blade of the Windseeker");
        assert_eq!(first, second);
        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_icon_is_cached_as_absent() {
        let (details, game_data) = details(FakeGameData::default().with_item(2589, "Linen Cloth", None));

        assert_eq!(details.get_item_icon(2589).await.unwrap(), None);
        assert_eq!(details.get_item_icon(2589).await.unwrap(), None);
        assert_eq!(game_data.icon_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_cached() {
        let (details, game_data) = details(FakeGameData::default());

        let err = details.get_item_name(7).await.unwrap_err();
        assert!(matches!(err, ServanaError::NotFound(_)));
        assert!(details.get_item_name(7).await.is_err());

        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 2);
        assert!(details.cached_names().unwrap().is_empty());
    }

    fn counted(game: &Arc<FakeExchange>, game_data: FakeGameData) -> (ItemDetails, Arc<FakeGameData>) {
        let pricing = FakeExchange::new(Provider::MarketPricing, Some(3600));
        let game_data = Arc::new(game_data);
        let details = ItemDetails::new(
            tokens_over(game, &pricing),
            game_data.clone(),
            Arc::new(KeyedCache::open_in_memory(namespaces::ITEM_NAMES).unwrap()),
            Arc::new(KeyedCache::open_in_memory(namespaces::ITEM_ICONS).unwrap()),
        );
        (details, game_data)
    }

    #[tokio::test]
    async fn test_auth_failure_invalidates_token() {
        let game = FakeExchange::new(Provider::GameData, Some(1800));
        let (details, _) = counted(&game, FakeGameData::default().with_item_failure(Failure::Auth));

        let err = details.get_item_icon(1).await.unwrap_err();
        assert!(matches!(err, ServanaError::Auth(_)));
        assert_eq!(details.cached_icon(1).unwrap(), None);
        assert_eq!(game.calls(), 1);

        let _ = details.get_item_name(1).await;
        assert_eq!(game.calls(), 2);
        assert!(details.cached_names().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_exchange_skips_lookup() {
        let game = FakeExchange::failing(Provider::GameData);
        let (details, game_data) = counted(&game, FakeGameData::default().with_item(2589, "Linen Cloth", None));

        let err = details.get_item(2589).await.unwrap_err();
        assert!(matches!(err, ServanaError::Auth(_)));
        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 0);
        assert!(details.cached_names().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_item_combines_name_and_icon() {
        let (details, _) = details(FakeGameData::default().with_item(
            2589,
            "Linen Cloth",
            Some("https://render.worldofwarcraft.com/us/icons/56/inv_fabric_linen_01.jpg"),
        ));

        let item = details.get_item(2589).await.unwrap();
        assert_eq!(item.name, "Linen Cloth");
        assert!(item.icon_url.unwrap().ends_with("inv_fabric_linen_01.jpg"));
        assert_eq!(details.cached_names().unwrap(), vec![(2589, "Linen Cloth".to_string())]);
    }

    #[tokio::test]
    async fn test_fill_cache_skips_cached_and_records_failures() {
        let (details, game_data) = details(
            FakeGameData::default()
                .with_item(1, "Linen Cloth", None)
                .with_item(2, "Wool Cloth", Some("wool.jpg"))
                .with_item(3, "Silk Cloth", Some("silk.jpg")),
        );
        details.get_item(1).await.unwrap();

        let report = details.fill_cache(BTreeSet::from([1, 2, 3, 4])).await;

        assert_eq!(report.items, 4);
        assert_eq!(report.names_added, 2);
        assert_eq!(report.icons_added, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item_id, 4);
        assert_eq!(report.failed[0].category, ErrorCategory::NotFound);

        // One earlier lookup plus items 2, 3 and 4
        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 4);
        assert_eq!(details.cached_icon(3).unwrap().as_deref(), Some("silk.jpg"));

        // Failed items are retried, cached ones are not
        let again = details.fill_cache(BTreeSet::from([1, 2, 3, 4])).await;
        assert_eq!(again.names_added, 0);
        assert_eq!(again.failed.len(), 1);
        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 5);
        assert_eq!(details.cached_names().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fill_cache_continues_past_rate_limits() {
        let (details, game_data) =
            details(FakeGameData::default().with_item_failure(Failure::RateLimited));

        let report = details.fill_cache(BTreeSet::from([10, 11, 12])).await;

        assert_eq!(report.failed.len(), 3);
        assert!(report
            .failed
            .iter()
            .all(|f| f.category == ErrorCategory::RateLimited));
        assert_eq!(game_data.name_calls.load(Ordering::SeqCst), 3);
        assert!(details.cached_names().unwrap().is_empty());
    }
}
