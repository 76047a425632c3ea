//! In-memory store.
//!
//! Implements both [`GeocodeCache`] and [`MapStore`] behind a single async
//! mutex, which makes every operation trivially atomic. Contents are lost when
//! the process exits; use it for tests and local experiments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pinmap_core::{Coordinates, MapId, NewMap, NormalizedAddress, Pin, ResolvedPin, SharedMap};
use tokio::sync::Mutex;

use super::{GeocodeCache, MapStore, StoreError};

/// In-memory implementation of the store traits.
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    geocode: HashMap<NormalizedAddress, CacheEntry>,
    maps: HashMap<MapId, StoredMap>,
}

#[derive(Clone, Copy)]
struct CacheEntry {
    coordinates: Coordinates,
    updated_at: DateTime<Utc>,
}

struct StoredMap {
    map: NewMap,
    view_count: i64,
    pins: Vec<Pin>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored maps.
    pub async fn map_count(&self) -> usize {
        self.inner.lock().await.maps.len()
    }

    /// Number of stored pins across all maps.
    pub async fn pin_count(&self) -> usize {
        self.inner
            .lock()
            .await
            .maps
            .values()
            .map(|stored| stored.pins.len())
            .sum()
    }

    /// Number of geocode cache entries.
    pub async fn cache_len(&self) -> usize {
        self.inner.lock().await.geocode.len()
    }

    /// When the cache entry for `address` was last written.
    pub async fn cache_updated_at(&self, address: &NormalizedAddress) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .await
            .geocode
            .get(address)
            .map(|entry| entry.updated_at)
    }
}

#[async_trait]
impl GeocodeCache for MemoryStore {
    async fn get(&self, address: &NormalizedAddress) -> Result<Option<Coordinates>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .geocode
            .get(address)
            .map(|entry| entry.coordinates))
    }

    async fn put(
        &self,
        address: &NormalizedAddress,
        coordinates: Coordinates,
    ) -> Result<(), StoreError> {
        self.inner.lock().await.geocode.insert(
            address.clone(),
            CacheEntry {
                coordinates,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl MapStore for MemoryStore {
    async fn create(&self, map: &NewMap, pins: &[ResolvedPin]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.maps.contains_key(&map.id) {
            return Err(StoreError::Conflict("map id already exists".to_owned()));
        }

        inner.maps.insert(
            map.id.clone(),
            StoredMap {
                map: map.clone(),
                view_count: 0,
                pins: pins.iter().cloned().map(Pin::from).collect(),
            },
        );
        Ok(())
    }

    async fn fetch(&self, id: &MapId) -> Result<Option<SharedMap>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.maps.get_mut(id) else {
            return Ok(None);
        };

        stored.view_count += 1;

        Ok(Some(SharedMap {
            id: stored.map.id.clone(),
            title: stored.map.title.clone(),
            created_at: stored.map.created_at,
            expires_at: None,
            owner: None,
            view_count: stored.view_count,
            pins: stored.pins.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
