//! Keyed cache of last-fetched entity collections with explicit staleness.
//!
//! Each entry remembers when it was fetched and whether it was invalidated; readers decide
//! when to refetch through [`EntityCache::get_or_refresh`] instead of mutating shared state
//! from arbitrary places.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Cross-cutting collections the back-office keeps around between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKey {
    Amenities,
    Properties,
    PendingReviews,
    Users,
    Payments,
}

impl CollectionKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Amenities => "Amenities",
            Self::Properties => "Properties",
            Self::PendingReviews => "Pending Reviews",
            Self::Users => "Users",
            Self::Payments => "Payments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A cached value together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedCollection<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
    pub freshness: Freshness,
    /// Set when a refresh failed and the stale copy is served instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("failed to load {key}: {reason}")]
    Load { key: String, reason: String },
}

/// Fetches a collection from its system of record.
#[async_trait]
pub trait CollectionLoader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> Result<V, String>;
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
    invalidated: bool,
}

#[derive(Debug)]
pub struct EntityCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read an entry as of `now`, without refetching.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<CachedCollection<V>> {
        let entries = self.lock();
        entries.get(key).map(|entry| self.view(entry, now, None))
    }

    pub fn put(&self, key: K, value: V, fetched_at: DateTime<Utc>) {
        self.lock().insert(
            key,
            Entry {
                value,
                fetched_at,
                invalidated: false,
            },
        );
    }

    /// Mark an entry stale; the value stays available until it is refetched.
    pub fn invalidate(&self, key: &K) -> bool {
        match self.lock().get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                debug!(?key, "cache entry invalidated");
                true
            }
            None => false,
        }
    }

    pub fn invalidate_all(&self) {
        for entry in self.lock().values_mut() {
            entry.invalidated = true;
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    /// Serve a fresh entry, or refetch through `loader` when missing or stale.
    ///
    /// A failed refetch falls back to the stale copy (with `refresh_error` set); it is only an
    /// error when there is nothing cached at all.
    pub async fn get_or_refresh<L>(
        &self,
        key: &K,
        loader: &L,
        now: DateTime<Utc>,
    ) -> Result<CachedCollection<V>, CacheError>
    where
        L: CollectionLoader<K, V> + ?Sized,
    {
        if let Some(cached) = self.get(key, now) {
            if cached.freshness == Freshness::Fresh {
                return Ok(cached);
            }
        }

        match loader.load(key).await {
            Ok(value) => {
                self.put(key.clone(), value.clone(), now);
                Ok(CachedCollection {
                    value,
                    fetched_at: now,
                    freshness: Freshness::Fresh,
                    refresh_error: None,
                })
            }
            Err(reason) => {
                warn!(?key, %reason, "collection refresh failed");
                let entries = self.lock();
                match entries.get(key) {
                    Some(entry) => Ok(self.view(entry, now, Some(reason))),
                    None => Err(CacheError::Load {
                        key: format!("{key:?}"),
                        reason,
                    }),
                }
            }
        }
    }

    fn view(
        &self,
        entry: &Entry<V>,
        now: DateTime<Utc>,
        error: Option<String>,
    ) -> CachedCollection<V> {
        let expired = now.signed_duration_since(entry.fetched_at) >= self.ttl;
        let freshness = if entry.invalidated || expired || error.is_some() {
            Freshness::Stale
        } else {
            Freshness::Fresh
        };

        CachedCollection {
            value: entry.value.clone(),
            fetched_at: entry.fetched_at,
            freshness,
            refresh_error: error,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
