//! `PostgreSQL` geocode cache.

use async_trait::async_trait;
use chrono::Utc;
use pinmap_core::{Coordinates, NormalizedAddress};
use sqlx::PgPool;
use tracing::instrument;

use super::{GeocodeCache, StoreError};

/// Geocode cache backed by the `pinmap.geocode_cache` table.
#[derive(Clone)]
pub struct PgGeocodeCache {
    pool: PgPool,
}

impl PgGeocodeCache {
    /// Create a new cache over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GeocodeCache for PgGeocodeCache {
    #[instrument(skip(self, address), fields(address = %address))]
    async fn get(&self, address: &NormalizedAddress) -> Result<Option<Coordinates>, StoreError> {
        let row: Option<(f64, f64)> = sqlx::query_as(
            r"
            SELECT lat, lng FROM pinmap.geocode_cache
            WHERE address_norm = $1
            ",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Coordinates::from))
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn put(
        &self,
        address: &NormalizedAddress,
        coordinates: Coordinates,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO pinmap.geocode_cache (address_norm, lat, lng, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (address_norm)
            DO UPDATE SET lat = EXCLUDED.lat, lng = EXCLUDED.lng, updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(address)
        .bind(coordinates.lat)
        .bind(coordinates.lng)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
