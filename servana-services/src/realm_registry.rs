//! Realm Registry
//!
//! Known connected realms come from a CSV file (`id,name` or `id:name` per
//! line). Whether a realm takes part in comparisons is stored separately in
//! the `realm_settings` cache; a realm without a stored flag is enabled.

use servana_core::{MarketRegistry, Realm, RealmId, ServanaError, ServanaResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::keyed_cache::KeyedCache;

/// Parse a realm list, skipping blank, header and malformed lines
///
/// The name is the second field; further fields are ignored. A later line
/// for the same id replaces the earlier one. Result is ordered by id.
pub fn parse_realm_list(content: &str) -> Vec<(RealmId, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut realms = BTreeMap::new();

    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping realm line {}: {}", idx + 1, e);
                continue;
            }
        };

        let parsed = match (record.get(0), record.get(1)) {
            (Some(id), Some(name)) => Some((id, name)),
            (Some(field), None) => field.split_once(':'),
            _ => None,
        };

        let Some((id, name)) = parsed else {
            continue;
        };
        let Ok(id) = id.trim().parse::<RealmId>() else {
            continue;
        };

        if let Some(previous) = realms.insert(id, name.trim().to_string()) {
            debug!("Realm {} listed again, replacing {:?}", id, previous);
        }
    }

    realms.into_iter().collect()
}

/// Realm registry backed by a CSV file and a settings cache
pub struct CsvRealmRegistry {
    path: PathBuf,
    settings: Arc<KeyedCache<bool>>,
}

impl CsvRealmRegistry {
    pub fn new(path: impl Into<PathBuf>, settings: Arc<KeyedCache<bool>>) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every known realm with its enabled flag, sorted by name
    pub fn all(&self) -> ServanaResult<Vec<Realm>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Realm list {:?} does not exist, no realms known", self.path);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(ServanaError::config(format!(
                    "Failed to read realm list {:?}: {}",
                    self.path, e
                )))
            }
        };

        let mut realms = Vec::new();
        for (id, name) in parse_realm_list(&content) {
            let enabled = self.settings.lookup(&id.to_string())?.unwrap_or(true);
            realms.push(Realm { id, name, enabled });
        }
        realms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(realms)
    }

    pub fn get(&self, realm_id: RealmId) -> ServanaResult<Realm> {
        self.all()?
            .into_iter()
            .find(|r| r.id == realm_id)
            .ok_or_else(|| ServanaError::not_found(format!("realm {}", realm_id)))
    }

    /// Include or exclude a realm from comparisons
    pub fn set_enabled(&self, realm_id: RealmId, enabled: bool) -> ServanaResult<Realm> {
        let mut realm = self.get(realm_id)?;

        self.settings.put(&realm_id.to_string(), &enabled)?;
        info!(
            "Realm {} ({}) {}",
            realm.id,
            realm.name,
            if enabled { "enabled" } else { "disabled" }
        );

        realm.enabled = enabled;
        Ok(realm)
    }
}

impl MarketRegistry for CsvRealmRegistry {
    fn selected_realms(&self) -> ServanaResult<Vec<Realm>> {
        Ok(self.all()?.into_iter().filter(|r| r.enabled).collect())
    }
}
