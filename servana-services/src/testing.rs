//! Counting fakes for the remote API traits

use async_trait::async_trait;
use servana_core::{
    AuctionListing, Copper, GameDataApi, IssuedToken, ItemId, MarketStat, PricingApi, Provider,
    RealmId, ServanaError, ServanaResult, TokenExchange,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::token_manager::TokenManager;

/// How a fake endpoint should fail
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Auth,
    RateLimited,
    Timeout,
    Server,
    Panic,
}

impl Failure {
    fn raise(self, what: &str) -> ServanaError {
        match self {
            Failure::Auth => ServanaError::auth(format!("{} rejected token", what)),
            Failure::RateLimited => ServanaError::rate_limited(what),
            Failure::Timeout => ServanaError::timeout(what),
            Failure::Server => ServanaError::remote(503, what),
            Failure::Panic => panic!("{} exploded", what),
        }
    }
}

pub struct FakeExchange {
    provider: Provider,
    expires_in: Option<i64>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeExchange {
    pub fn new(provider: Provider, expires_in: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            expires_in,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(provider: Provider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            expires_in: None,
            fail: true,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(provider: Provider, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            provider,
            expires_in: None,
            fail: false,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for FakeExchange {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn exchange(&self) -> ServanaResult<IssuedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(ServanaError::auth("invalid_client"));
        }

        Ok(IssuedToken {
            access_token: format!("{:?}-token-{}", self.provider, n),
            expires_in: self.expires_in,
        })
    }
}

/// Token manager over non-failing fake exchanges
pub fn fake_tokens() -> Arc<TokenManager> {
    Arc::new(TokenManager::new(
        FakeExchange::new(Provider::GameData, Some(1800)),
        FakeExchange::new(Provider::MarketPricing, Some(3600)),
    ))
}

/// Token manager over the given exchanges, for counting exchange calls
pub fn tokens_over(game: &Arc<FakeExchange>, pricing: &Arc<FakeExchange>) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(game.clone(), pricing.clone()))
}

pub fn listing(item_id: ItemId, buyout: u64) -> AuctionListing {
    AuctionListing {
        item_id: Some(item_id),
        buyout: Some(Copper(buyout)),
        quantity: Some(1),
    }
}

#[derive(Default)]
pub struct FakeGameData {
    names: HashMap<ItemId, String>,
    icons: HashMap<ItemId, Option<String>>,
    auctions: HashMap<RealmId, Vec<AuctionListing>>,
    realm_failures: HashMap<RealmId, Failure>,
    item_failure: Option<Failure>,
    pub name_calls: AtomicUsize,
    pub icon_calls: AtomicUsize,
    pub auction_calls: AtomicUsize,
}

impl FakeGameData {
    pub fn with_item(mut self, item_id: ItemId, name: &str, icon: Option<&str>) -> Self {
        self.names.insert(item_id, name.to_string());
        self.icons.insert(item_id, icon.map(str::to_string));
        self
    }

    pub fn with_auctions(mut self, realm_id: RealmId, listings: Vec<AuctionListing>) -> Self {
        self.auctions.insert(realm_id, listings);
        self
    }

    pub fn with_realm_failure(mut self, realm_id: RealmId, failure: Failure) -> Self {
        self.realm_failures.insert(realm_id, failure);
        self
    }

    pub fn with_item_failure(mut self, failure: Failure) -> Self {
        self.item_failure = Some(failure);
        self
    }

    pub fn auction_calls(&self) -> usize {
        self.auction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameDataApi for FakeGameData {
    async fn item_name(&self, _token: &str, item_id: ItemId) -> ServanaResult<String> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.item_failure {
            return Err(failure.raise("item"));
        }
        self.names
            .get(&item_id)
            .cloned()
            .ok_or_else(|| ServanaError::not_found(format!("item {}", item_id)))
    }

    async fn item_icon(&self, _token: &str, item_id: ItemId) -> ServanaResult<Option<String>> {
        self.icon_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.item_failure {
            return Err(failure.raise("media"));
        }
        self.icons
            .get(&item_id)
            .cloned()
            .ok_or_else(|| ServanaError::not_found(format!("media {}", item_id)))
    }

    async fn realm_auctions(
        &self,
        _token: &str,
        realm_id: RealmId,
    ) -> ServanaResult<Vec<AuctionListing>> {
        self.auction_calls.fetch_add(1, Ordering::SeqCst);
        // Yield so spawned refreshes interleave
        tokio::task::yield_now().await;

        if let Some(failure) = self.realm_failures.get(&realm_id) {
            return Err(failure.raise(&format!("realm {}", realm_id)));
        }
        Ok(self.auctions.get(&realm_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakePricing {
    stats: HashMap<ItemId, MarketStat>,
    failure: Option<Failure>,
    pub calls: AtomicUsize,
}

impl FakePricing {
    pub fn with_stat(mut self, item_id: ItemId, market_value: u64, sale_rate: f64) -> Self {
        self.stats.insert(
            item_id,
            MarketStat {
                item_id,
                market_value: Some(Copper(market_value)),
                sale_rate: Some(sale_rate),
            },
        );
        self
    }

    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PricingApi for FakePricing {
    async fn region_item_stats(&self, _token: &str, item_id: ItemId) -> ServanaResult<MarketStat> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.failure {
            return Err(failure.raise("pricing"));
        }
        self.stats
            .get(&item_id)
            .copied()
            .ok_or_else(|| ServanaError::not_found(format!("pricing item {}", item_id)))
    }
}
