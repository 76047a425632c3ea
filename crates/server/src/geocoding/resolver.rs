//! Address resolution pipeline.
//!
//! Lookup order for a normalized address:
//!
//! 1. In-process memo (bounded, coalesces concurrent loads of one key)
//! 2. Durable [`GeocodeCache`]
//! 3. [`GeocodeProvider`], whose top candidate is written back to the cache
//!
//! Failures are never memoized or cached, so a later request retries the
//! provider.

use std::sync::Arc;

use moka::future::Cache;
use pinmap_core::{Coordinates, NormalizedAddress, normalize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::{GeocodeProvider, ProviderError};
use crate::db::GeocodeCache;

/// Errors returned by [`GeocodeResolver`].
///
/// Cloneable because one failed load is shared by every caller waiting on the
/// same key.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The provider found no candidate for the address.
    #[error("no location found for address: {0}")]
    UnresolvableAddress(String),

    /// The provider could not be reached, rejected the call, or has no key.
    #[error("geocoding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The durable cache failed.
    #[error("geocode cache error: {0}")]
    Store(String),
}

impl From<ProviderError> for ResolveError {
    fn from(err: ProviderError) -> Self {
        Self::ProviderUnavailable(err.to_string())
    }
}

/// A resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The cache key the coordinates were stored under.
    pub address: NormalizedAddress,
    pub coordinates: Coordinates,
}

/// Resolves raw address text to coordinates through the cache hierarchy.
pub struct GeocodeResolver {
    cache: Arc<dyn GeocodeCache>,
    provider: Arc<dyn GeocodeProvider>,
    memo: Cache<NormalizedAddress, Coordinates>,
}

impl GeocodeResolver {
    /// Create a resolver whose memo holds at most `memo_capacity` addresses.
    #[must_use]
    pub fn new(
        cache: Arc<dyn GeocodeCache>,
        provider: Arc<dyn GeocodeProvider>,
        memo_capacity: u64,
    ) -> Self {
        Self {
            cache,
            provider,
            memo: Cache::new(memo_capacity),
        }
    }

    /// Normalize `raw` and resolve it.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub async fn resolve(&self, raw: &str) -> Result<Resolution, ResolveError> {
        let address = normalize(raw);
        let coordinates = self.resolve_normalized(&address).await?;
        Ok(Resolution {
            address,
            coordinates,
        })
    }

    /// Resolve an already-normalized address.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    #[instrument(skip(self, address), fields(address = %address))]
    pub async fn resolve_normalized(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Coordinates, ResolveError> {
        if address.is_empty() {
            return Err(ResolveError::UnresolvableAddress(String::new()));
        }

        self.memo
            .try_get_with(address.clone(), self.load(address))
            .await
            .map_err(|e| (*e).clone())
    }

    async fn load(&self, address: &NormalizedAddress) -> Result<Coordinates, ResolveError> {
        match self.cache.get(address).await {
            Ok(Some(coordinates)) => {
                debug!("Geocode cache hit");
                return Ok(coordinates);
            }
            Ok(None) => debug!("Geocode cache miss"),
            Err(e) => {
                warn!(error = %e, "Geocode cache lookup failed");
                return Err(ResolveError::Store(e.to_string()));
            }
        }

        let candidates = self.provider.geocode(address).await.map_err(|e| {
            warn!(error = %e, "Geocoding provider failed");
            ResolveError::from(e)
        })?;

        let Some(coordinates) = candidates.first().copied() else {
            warn!("Geocoding provider returned no candidates");
            return Err(ResolveError::UnresolvableAddress(address.to_string()));
        };

        info!(
            lat = coordinates.lat,
            lng = coordinates.lng,
            candidates = candidates.len(),
            "Address geocoded"
        );

        self.cache.put(address, coordinates).await.map_err(|e| {
            warn!(error = %e, "Geocode cache write failed");
            ResolveError::Store(e.to_string())
        })?;

        Ok(coordinates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::MemoryStore;
    use crate::geocoding::testing::ScriptedProvider;

    fn resolver(store: &MemoryStore, provider: &Arc<ScriptedProvider>) -> GeocodeResolver {
        GeocodeResolver::new(Arc::new(store.clone()), provider.clone(), 100)
    }

    #[tokio::test]
    async fn test_second_resolve_skips_provider() {
        let store = MemoryStore::new();
        let provider = Arc::new(ScriptedProvider::new().with("東京都千代田区1-1", &[(35.68, 139.76)]));
        let resolver = resolver(&store, &provider);

        let first = resolver.resolve("東京都千代田区１−１").await.unwrap();
        assert_eq!(first.address.as_str(), "東京都千代田区1-1");
        assert_eq!(first.coordinates, Coordinates::new(35.68, 139.76));

        let second = resolver.resolve("　東京都千代田区1-1 ").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_durable_cache_hit_skips_provider() {
        let store = MemoryStore::new();
        store
            .put(&normalize("大阪府大阪市1-2"), Coordinates::new(34.69, 135.5))
            .await
            .unwrap();
        let provider = Arc::new(ScriptedProvider::new());
        let resolver = resolver(&store, &provider);

        let resolution = resolver.resolve("大阪府大阪市１−２").await.unwrap();
        assert_eq!(resolution.coordinates, Coordinates::new(34.69, 135.5));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_top_candidate_wins() {
        let store = MemoryStore::new();
        let provider = Arc::new(
            ScriptedProvider::new().with("Springfield", &[(39.78, -89.65), (42.10, -72.59)]),
        );
        let resolver = resolver(&store, &provider);

        let resolution = resolver.resolve("Springfield").await.unwrap();
        assert_eq!(resolution.coordinates, Coordinates::new(39.78, -89.65));
        assert_eq!(
            store.get(&normalize("Springfield")).await.unwrap(),
            Some(Coordinates::new(39.78, -89.65))
        );
    }

    #[tokio::test]
    async fn test_zero_candidates_not_cached() {
        let store = MemoryStore::new();
        let provider = Arc::new(ScriptedProvider::new());
        let resolver = resolver(&store, &provider);

        let err = resolver.resolve("nowhere 99").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvableAddress(ref a) if a == "nowhere 99"));

        // A second attempt goes back to the provider
        resolver.resolve("nowhere 99").await.unwrap_err();
        assert_eq!(provider.calls(), 2);
        assert_eq!(store.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_unavailable() {
        let store = MemoryStore::new();
        let provider = Arc::new(ScriptedProvider::unavailable());
        let resolver = resolver(&store, &provider);

        let err = resolver.resolve("東京都").await.unwrap_err();
        assert!(matches!(err, ResolveError::ProviderUnavailable(_)));
        assert_eq!(store.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_blank_address_never_reaches_provider() {
        let store = MemoryStore::new();
        let provider = Arc::new(ScriptedProvider::new());
        let resolver = resolver(&store, &provider);

        let err = resolver.resolve("\u{3000} ").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvableAddress(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_address_single_provider_call() {
        let store = MemoryStore::new();
        let provider = Arc::new(
            ScriptedProvider::new()
                .with("渋谷区1-2-3", &[(35.66, 139.70)])
                .with_delay(Duration::from_millis(50)),
        );
        let resolver = Arc::new(resolver(&store, &provider));

        let handles: Vec<_> = ["渋谷区1-2-3", "渋谷区１−２−３", " 渋谷区1–2–3", "渋谷区1-2-3"]
            .into_iter()
            .map(|raw| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve(raw).await.unwrap() })
            })
            .collect();

        for handle in handles {
            let resolution = handle.await.unwrap();
            assert_eq!(resolution.coordinates, Coordinates::new(35.66, 139.70));
        }
        assert_eq!(provider.calls(), 1);
    }
}
