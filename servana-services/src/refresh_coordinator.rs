//! Concurrent Refresh Coordinator
//!
//! Refreshes many realms at once: one task per realm, all joined, no early
//! cancellation. Each task hands back its own result and the join sorts them
//! into successes and failures.

use futures::future::join_all;
use serde::Serialize;
use servana_core::{
    ErrorCategory, MarketPriceSnapshot, MarketRegistry, RealmId, ServanaError, ServanaResult,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::price_fetcher::PriceFetcher;

/// A realm whose refresh did not complete
#[derive(Debug)]
pub struct RefreshFailure {
    pub realm_id: RealmId,
    pub error: ServanaError,
}

/// Outcome of one coordinated refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub snapshots: BTreeMap<RealmId, MarketPriceSnapshot>,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Compact, serializable view of the report
    pub fn summary(&self) -> RefreshSummary {
        RefreshSummary {
            refreshed: self
                .snapshots
                .iter()
                .map(|(id, s)| RefreshedRealm {
                    realm_id: *id,
                    items: s.len(),
                })
                .collect(),
            failed: self
                .failures
                .iter()
                .map(|f| FailedRealm {
                    realm_id: f.realm_id,
                    error: f.error.to_string(),
                    category: f.error.category(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub refreshed: Vec<RefreshedRealm>,
    pub failed: Vec<FailedRealm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshedRealm {
    pub realm_id: RealmId,
    pub items: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRealm {
    pub realm_id: RealmId,
    pub error: String,
    pub category: ErrorCategory,
}

pub struct RefreshCoordinator {
    fetcher: Arc<PriceFetcher>,
}

impl RefreshCoordinator {
    pub fn new(fetcher: Arc<PriceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Refresh every realm in `realm_ids` concurrently
    #[instrument(skip(self))]
    pub async fn refresh_selected(&self, realm_ids: &BTreeSet<RealmId>) -> RefreshReport {
        info!("Refreshing {} realms", realm_ids.len());

        let handles: Vec<_> = realm_ids
            .iter()
            .map(|&realm_id| {
                let fetcher = Arc::clone(&self.fetcher);
                let handle = tokio::spawn(async move { fetcher.refresh_market(realm_id).await });
                (realm_id, handle)
            })
            .collect();

        let (ids, handles): (Vec<RealmId>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut report = RefreshReport::default();
        for (realm_id, joined) in ids.into_iter().zip(results) {
            let result = joined.unwrap_or_else(|e| {
                Err(ServanaError::internal(format!(
                    "refresh task for realm {} failed: {}",
                    realm_id, e
                )))
            });

            match result {
                Ok(snapshot) => {
                    report.snapshots.insert(realm_id, snapshot);
                }
                Err(error) => {
                    warn!("Realm {} refresh failed: {}", realm_id, error);
                    report.failures.push(RefreshFailure { realm_id, error });
                }
            }
        }

        info!(
            "Refresh finished: {} succeeded, {} failed",
            report.snapshots.len(),
            report.failures.len()
        );
        report
    }

    /// Refresh the realms the registry currently has selected
    pub async fn refresh_registry(
        &self,
        registry: &dyn MarketRegistry,
    ) -> ServanaResult<RefreshReport> {
        let realm_ids = registry.selected_realm_ids()?;
        Ok(self.refresh_selected(&realm_ids).await)
    }
}
