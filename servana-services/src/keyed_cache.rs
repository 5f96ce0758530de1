//! Keyed Cache
//!
//! Durable string-keyed store backed by one SQLite file per namespace.
//! Values are stored as JSON. Every `put` is committed before it returns,
//! and all access to a namespace goes through a single connection guarded
//! by a mutex.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use servana_core::ServanaError;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

/// Rows fetched per lock acquisition while enumerating
const ENTRIES_PAGE_SIZE: i64 = 256;

/// Well-known cache namespaces
pub mod namespaces {
    pub const ITEM_NAMES: &str = "item_names";
    pub const ITEM_ICONS: &str = "item_icons";
    pub const MARKET_STATS: &str = "market_stats";
    pub const AUCTION_PRICES: &str = "auction_prices";
    pub const REALM_SETTINGS: &str = "realm_settings";
}

/// Durable key-value store for one namespace
pub struct KeyedCache<V> {
    namespace: String,
    conn: Mutex<Connection>,
    _value: PhantomData<fn() -> V>,
}

impl<V> KeyedCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open (or create) the namespace's database under `dir`
    pub fn open<P: AsRef<Path>>(dir: P, namespace: &str) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir.as_ref()).map_err(|e| {
            CacheError::Io(format!("Failed to create cache directory: {}", e))
        })?;

        let path = dir.as_ref().join(format!("{}.db", namespace));
        let conn = Connection::open(&path).map_err(CacheError::Database)?;

        // WAL + FULL sync: a returned put survives a crash
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            "#,
        )
        .map_err(CacheError::Database)?;

        debug!("Opened cache namespace {} at {:?}", namespace, path);
        Self::with_connection(conn, namespace)
    }

    /// Create an in-memory cache (useful for testing)
    pub fn open_in_memory(namespace: &str) -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory().map_err(CacheError::Database)?;
        Self::with_connection(conn, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self, CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .map_err(CacheError::Database)?;

        Ok(Self {
            namespace: namespace.to_string(),
            conn: Mutex::new(conn),
            _value: PhantomData,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Check whether a key is present
    pub fn has(&self, key: &str) -> Result<bool, CacheError> {
        let conn = self.conn.lock();

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM entries WHERE key = ?1)",
                params![key],
                |row| row.get(0),
            )
            .map_err(CacheError::Database)?;

        Ok(exists)
    }

    /// Get a value, failing with [`CacheError::NotFound`] when absent
    pub fn get(&self, key: &str) -> Result<V, CacheError> {
        self.lookup(key)?.ok_or_else(|| CacheError::NotFound {
            namespace: self.namespace.clone(),
            key: key.to_string(),
        })
    }

    /// Get a value if present
    pub fn lookup(&self, key: &str) -> Result<Option<V>, CacheError> {
        let raw: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(CacheError::Database)?
        };

        raw.map(|json| self.decode(key, &json)).transpose()
    }

    /// Insert or replace a value; durable once this returns
    pub fn put(&self, key: &str, value: &V) -> Result<(), CacheError> {
        let json = serde_json::to_string(value).map_err(|e| {
            CacheError::Serialization(format!("{}/{}: {}", self.namespace, key, e))
        })?;

        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![key, json, Utc::now().timestamp()],
        )
        .map_err(CacheError::Database)?;

        Ok(())
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(CacheError::Database)?;

        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Lazily enumerate every entry
    ///
    /// Each call starts a fresh enumeration. Rows are read a page at a time
    /// and the lock is released between pages.
    pub fn entries(&self) -> Entries<'_, V> {
        Entries {
            cache: self,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&self, after: Option<&str>) -> Result<Vec<(String, String)>, CacheError> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT key, value FROM entries
                WHERE ?1 IS NULL OR key > ?1
                ORDER BY key ASC
                LIMIT ?2
                "#,
            )
            .map_err(CacheError::Database)?;

        let rows = stmt
            .query_map(params![after, ENTRIES_PAGE_SIZE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(CacheError::Database)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(CacheError::Database)?;

        Ok(rows)
    }

    fn decode(&self, key: &str, json: &str) -> Result<V, CacheError> {
        serde_json::from_str(json).map_err(|e| {
            CacheError::Serialization(format!("{}/{}: {}", self.namespace, key, e))
        })
    }
}

impl<V> std::fmt::Debug for KeyedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedCache")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Lazy enumeration over a [`KeyedCache`]
pub struct Entries<'a, V> {
    cache: &'a KeyedCache<V>,
    after: Option<String>,
    buffer: VecDeque<(String, String)>,
    exhausted: bool,
}

impl<V> Iterator for Entries<'_, V>
where
    V: Serialize + DeserializeOwned,
{
    type Item = Result<(String, V), CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            match self.cache.fetch_page(self.after.as_deref()) {
                Ok(page) => {
                    if (page.len() as i64) < ENTRIES_PAGE_SIZE {
                        self.exhausted = true;
                    }
                    if let Some((last_key, _)) = page.last() {
                        self.after = Some(last_key.clone());
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }

        let (key, json) = self.buffer.pop_front()?;
        Some(self.cache.decode(&key, &json).map(|value| (key, value)))
    }
}

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Key {key} not found in {namespace}")]
    NotFound { namespace: String, key: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<CacheError> for ServanaError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::NotFound { .. } => ServanaError::not_found(e.to_string()),
            _ => ServanaError::cache(e.to_string()),
        }
    }
}
