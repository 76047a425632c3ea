//! Map creation and retrieval.
//!
//! [`MapService`] ties the geocode resolver, id generation and the map store
//! together. A map is only persisted once every pin resolved; any failure
//! aborts the whole request and nothing is written to the map store.

use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use pinmap_core::{CreatedMap, MapId, NewMap, RawPin, ResolvedPin, SharedMap};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::db::{MapStore, StoreError};
use crate::geocoding::{GeocodeResolver, ResolveError};

/// How many ids are tried before a colliding create is given up.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// Errors returned by [`MapService`].
#[derive(Debug, Error)]
pub enum MapError {
    /// Request failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A pin address could not be geocoded.
    #[error("failed to geocode address '{address}'")]
    UnresolvableAddress {
        /// Zero-based position of the pin in the request.
        index: usize,
        /// The address as submitted.
        address: String,
    },

    /// The geocoding provider is unreachable or unconfigured.
    #[error("geocoding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No map with the requested id.
    #[error("map not found: {0}")]
    NotFound(String),

    /// Persisting or loading the map failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The geocode cache failed during resolution.
    #[error("geocode cache error: {0}")]
    Cache(String),
}

/// Produces candidate ids for new maps.
pub trait MapIdGenerator: Send + Sync {
    /// Generate a fresh candidate id. Uniqueness is enforced by the store.
    fn generate(&self) -> MapId;
}

/// Random alphanumeric ids of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(MapId::DEFAULT_LENGTH)
    }
}

impl MapIdGenerator for RandomIdGenerator {
    fn generate(&self) -> MapId {
        MapId::generate(&mut rand::rng(), self.length)
    }
}

/// Creates and serves shared maps.
pub struct MapService {
    resolver: Arc<GeocodeResolver>,
    store: Arc<dyn MapStore>,
    ids: Arc<dyn MapIdGenerator>,
    frontend_url: String,
    resolve_concurrency: usize,
}

impl MapService {
    /// Create a new service.
    ///
    /// `resolve_concurrency` bounds how many pins of one request are geocoded
    /// at once; `1` resolves them strictly in order.
    #[must_use]
    pub fn new(
        resolver: Arc<GeocodeResolver>,
        store: Arc<dyn MapStore>,
        ids: Arc<dyn MapIdGenerator>,
        frontend_url: &str,
        resolve_concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            store,
            ids,
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
            resolve_concurrency: resolve_concurrency.max(1),
        }
    }

    /// Public URL a map is shared under.
    #[must_use]
    pub fn share_url(&self, id: &MapId) -> String {
        format!("{}/m/{id}", self.frontend_url)
    }

    /// Geocode every pin and persist the map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank title, `UnresolvableAddress` naming
    /// the first pin that could not be geocoded, `ProviderUnavailable` when
    /// the provider cannot be used, and `Store` when persisting fails.
    #[instrument(skip(self, title, pins), fields(pins = pins.len()))]
    pub async fn create_map(&self, title: &str, pins: Vec<RawPin>) -> Result<CreatedMap, MapError> {
        if title.trim().is_empty() {
            return Err(MapError::InvalidInput("title must not be empty".to_owned()));
        }

        let resolved = self.resolve_pins(pins).await?;
        let id = self.persist(title, &resolved).await?;

        info!(map_id = %id, pins = resolved.len(), "Map created");

        Ok(CreatedMap {
            share_url: self.share_url(&id),
            map_id: id,
        })
    }

    /// Load a map, counting the view.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or malformed ids.
    #[instrument(skip(self))]
    pub async fn get_map(&self, map_id: &str) -> Result<SharedMap, MapError> {
        let Ok(id) = map_id.parse::<MapId>() else {
            debug!("Malformed map id");
            return Err(MapError::NotFound(map_id.to_owned()));
        };

        self.store
            .fetch(&id)
            .await?
            .ok_or_else(|| MapError::NotFound(map_id.to_owned()))
    }

    /// Check that the map store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the store error if the check fails.
    pub async fn ready(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    async fn resolve_pins(&self, pins: Vec<RawPin>) -> Result<Vec<ResolvedPin>, MapError> {
        // `buffered` keeps results in request order and stops polling new
        // lookups after the first failure.
        stream::iter(pins.into_iter().enumerate())
            .map(|(index, raw)| async move {
                match self.resolver.resolve(&raw.address).await {
                    Ok(resolution) => Ok(ResolvedPin::from_raw(
                        raw,
                        resolution.address,
                        resolution.coordinates,
                    )),
                    Err(e) => Err(pin_error(index, raw.address, e)),
                }
            })
            .buffered(self.resolve_concurrency)
            .try_collect()
            .await
    }

    async fn persist(&self, title: &str, pins: &[ResolvedPin]) -> Result<MapId, MapError> {
        let mut attempt = 1;
        loop {
            let map = NewMap {
                id: self.ids.generate(),
                title: title.to_owned(),
                created_at: Utc::now(),
            };

            match self.store.create(&map, pins).await {
                Ok(()) => return Ok(map.id),
                Err(e) if e.is_conflict() && attempt < MAX_CREATE_ATTEMPTS => {
                    warn!(map_id = %map.id, attempt, "Map id collision, regenerating");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn pin_error(index: usize, address: String, err: ResolveError) -> MapError {
    match err {
        ResolveError::UnresolvableAddress(_) => {
            warn!(index, address = %address, "Pin address could not be geocoded");
            MapError::UnresolvableAddress { index, address }
        }
        ResolveError::ProviderUnavailable(reason) => MapError::ProviderUnavailable(reason),
        ResolveError::Store(reason) => MapError::Cache(reason),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use pinmap_core::{Coordinates, normalize};

    use super::*;
    use crate::db::{GeocodeCache, MemoryStore};
    use crate::geocoding::testing::ScriptedProvider;

    /// Hands out a fixed sequence of ids, repeating the last one.
    struct SequenceIds(Mutex<VecDeque<&'static str>>);

    impl SequenceIds {
        fn new(ids: &[&'static str]) -> Self {
            Self(Mutex::new(ids.iter().copied().collect()))
        }
    }

    impl MapIdGenerator for SequenceIds {
        fn generate(&self) -> MapId {
            let mut ids = self.0.lock().unwrap();
            let id = if ids.len() > 1 {
                ids.pop_front().unwrap()
            } else {
                *ids.front().unwrap()
            };
            MapId::parse(id).unwrap()
        }
    }

    fn raw(name: &str, address: &str) -> RawPin {
        RawPin {
            name: name.to_string(),
            address: address.to_string(),
            note: None,
        }
    }

    fn service(
        store: &MemoryStore,
        provider: ScriptedProvider,
        ids: Arc<dyn MapIdGenerator>,
        concurrency: usize,
    ) -> MapService {
        let resolver = GeocodeResolver::new(Arc::new(store.clone()), Arc::new(provider), 100);
        MapService::new(
            Arc::new(resolver),
            Arc::new(store.clone()),
            ids,
            "https://pinmap.example/",
            concurrency,
        )
    }

    fn home_search_provider() -> ScriptedProvider {
        ScriptedProvider::new()
            .with("東京都千代田区1-1", &[(35.6852, 139.7528)])
            .with("東京都渋谷区道玄坂2-1", &[(35.6580, 139.6994)])
            .with("東京都新宿区西新宿2-8-1", &[(35.6896, 139.6917)])
    }

    #[test]
    fn test_random_ids_have_configured_length() {
        let ids = RandomIdGenerator::new(10);
        let id = ids.generate();
        assert_eq!(id.as_str().len(), 10);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(RandomIdGenerator::default().generate().as_str().len(), 6);
    }

    #[tokio::test]
    async fn test_home_search_scenario() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            home_search_provider(),
            Arc::new(SequenceIds::new(&["abc123"])),
            1,
        );

        let created = svc
            .create_map(
                "Home Search",
                vec![
                    raw("Office", "東京都千代田区１−１"),
                    raw("Station", "東京都渋谷区道玄坂２−１"),
                    RawPin {
                        note: Some("viewing on Saturday".to_string()),
                        ..raw("Apartment", "東京都新宿区西新宿２−８−１")
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(created.map_id.as_str(), "abc123");
        assert_eq!(created.share_url, "https://pinmap.example/m/abc123");

        let map = svc.get_map("abc123").await.unwrap();
        assert_eq!(map.title, "Home Search");
        assert_eq!(map.view_count, 1);

        let names: Vec<_> = map.pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Office", "Station", "Apartment"]);

        let office = &map.pins[0];
        assert_eq!(office.address, "東京都千代田区1-1");
        assert!((office.lat - 35.6852).abs() < f64::EPSILON);
        assert_eq!(office.note, "");
        assert_eq!(map.pins[2].note, "viewing on Saturday");
    }

    #[tokio::test]
    async fn test_failed_pin_creates_nothing() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            ScriptedProvider::new()
                .with("A町1", &[(1.0, 1.0)])
                .with("C町3", &[(3.0, 3.0)]),
            Arc::new(RandomIdGenerator::default()),
            1,
        );

        let err = svc
            .create_map(
                "Trip",
                vec![raw("a", "A町1"), raw("b", "B町２"), raw("c", "C町3")],
            )
            .await
            .unwrap_err();

        match err {
            MapError::UnresolvableAddress { index, address } => {
                assert_eq!(index, 1);
                assert_eq!(address, "B町２");
            }
            other => panic!("expected unresolvable address, got {other:?}"),
        }
        assert_eq!(store.map_count().await, 0);
        assert_eq!(store.pin_count().await, 0);
        // Earlier successful lookups stay cached
        assert!(store.get(&normalize("A町1")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_resolution_keeps_order() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            home_search_provider(),
            Arc::new(SequenceIds::new(&["fan0ut"])),
            3,
        );

        svc.create_map(
            "Fan out",
            vec![
                raw("3", "東京都新宿区西新宿2-8-1"),
                raw("1", "東京都千代田区1-1"),
                raw("2", "東京都渋谷区道玄坂2-1"),
            ],
        )
        .await
        .unwrap();

        let map = svc.get_map("fan0ut").await.unwrap();
        let coords: Vec<_> = map
            .pins
            .iter()
            .map(|p| Coordinates::new(p.lat, p.lng))
            .collect();
        assert_eq!(
            coords,
            vec![
                Coordinates::new(35.6896, 139.6917),
                Coordinates::new(35.6852, 139.7528),
                Coordinates::new(35.6580, 139.6994),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let store = MemoryStore::new();
        let provider = ScriptedProvider::new();
        let svc = service(&store, provider, Arc::new(RandomIdGenerator::default()), 1);

        let err = svc.create_map("  \u{3000}", vec![]).await.unwrap_err();
        assert!(matches!(err, MapError::InvalidInput(_)));
        assert_eq!(store.map_count().await, 0);
    }

    #[tokio::test]
    async fn test_title_stored_as_submitted() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            ScriptedProvider::new(),
            Arc::new(SequenceIds::new(&["padded"])),
            1,
        );

        svc.create_map("  Weekend Trip ", vec![]).await.unwrap();

        assert_eq!(svc.get_map("padded").await.unwrap().title, "  Weekend Trip ");
    }

    #[tokio::test]
    async fn test_empty_pin_list_is_allowed() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            ScriptedProvider::new(),
            Arc::new(SequenceIds::new(&["empty1"])),
            1,
        );

        svc.create_map("Nothing yet", vec![]).await.unwrap();
        assert!(svc.get_map("empty1").await.unwrap().pins.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_surfaces_unavailable() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            ScriptedProvider::unavailable(),
            Arc::new(RandomIdGenerator::default()),
            1,
        );

        let err = svc
            .create_map("Trip", vec![raw("a", "東京都")])
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_id_collision_regenerates() {
        let store = MemoryStore::new();
        let ids = Arc::new(SequenceIds::new(&["taken1", "taken1", "fresh1"]));
        let svc = service(&store, home_search_provider(), ids, 1);

        let first = svc.create_map("First", vec![]).await.unwrap();
        assert_eq!(first.map_id.as_str(), "taken1");

        let second = svc.create_map("Second", vec![]).await.unwrap();
        assert_eq!(second.map_id.as_str(), "fresh1");

        assert_eq!(svc.get_map("taken1").await.unwrap().title, "First");
        assert_eq!(svc.get_map("fresh1").await.unwrap().title, "Second");
    }

    #[tokio::test]
    async fn test_id_collision_gives_up() {
        let store = MemoryStore::new();
        let ids = Arc::new(SequenceIds::new(&["always"]));
        let svc = service(&store, home_search_provider(), ids, 1);

        svc.create_map("First", vec![]).await.unwrap();
        let err = svc.create_map("Second", vec![]).await.unwrap_err();

        assert!(matches!(err, MapError::Store(ref e) if e.is_conflict()));
        assert_eq!(store.map_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_not_found() {
        let store = MemoryStore::new();
        let svc = service(
            &store,
            ScriptedProvider::new(),
            Arc::new(RandomIdGenerator::default()),
            1,
        );

        assert!(matches!(
            svc.get_map("zzz999").await,
            Err(MapError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_map("../etc/passwd").await,
            Err(MapError::NotFound(_))
        ));
        assert!(svc.ready().await.is_ok());
    }
}
