//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::PinmapConfig;
use crate::db::{PgGeocodeCache, PgMapStore};
use crate::geocoding::{GeocodeResolver, GoogleGeocoder, ProviderError};
use crate::services::{MapService, RandomIdGenerator};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the map
/// service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    maps: MapService,
}

impl AppState {
    /// Create application state from an already wired map service.
    #[must_use]
    pub fn new(maps: MapService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { maps }),
        }
    }

    /// Wire the production stack: Postgres cache and store, Google provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding client cannot be built.
    pub fn from_pool(config: &PinmapConfig, pool: PgPool) -> Result<Self, ProviderError> {
        let provider = GoogleGeocoder::new(&config.geocoding)?;
        let resolver = GeocodeResolver::new(
            Arc::new(PgGeocodeCache::new(pool.clone())),
            Arc::new(provider),
            config.geocoding.memo_capacity,
        );

        let maps = MapService::new(
            Arc::new(resolver),
            Arc::new(PgMapStore::new(pool)),
            Arc::new(RandomIdGenerator::new(config.maps.id_length)),
            &config.frontend_url,
            config.maps.resolve_concurrency,
        );

        Ok(Self::new(maps))
    }

    /// Get a reference to the map service.
    #[must_use]
    pub fn maps(&self) -> &MapService {
        &self.inner.maps
    }
}
