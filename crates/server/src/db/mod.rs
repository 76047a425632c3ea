//! Persistence for maps, pins and the geocode cache.
//!
//! # Database: `pinmap`
//!
//! ## Tables
//!
//! - `maps` - Map metadata and view counter
//! - `pins` - Ordered pins belonging to a map
//! - `geocode_cache` - Normalized address → coordinates
//!
//! The rest of the server only sees the [`GeocodeCache`] and [`MapStore`]
//! traits. `PostgreSQL` implementations back the running service and
//! [`MemoryStore`] backs tests and local experiments.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p pinmap-cli -- migrate
//! ```

pub mod geocode_cache;
pub mod maps;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use pinmap_core::{Coordinates, MapId, NewMap, NormalizedAddress, ResolvedPin, SharedMap};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use geocode_cache::PgGeocodeCache;
pub use maps::PgMapStore;
pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Uniqueness violation (e.g., map id already taken).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Whether this is a uniqueness conflict worth retrying with a new key.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Durable normalized-address → coordinates cache.
///
/// Lookups are exact matches on the normalized key. Writes replace any
/// previous entry (last write wins) and stamp a fresh `updated_at`.
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    /// Look up coordinates for a normalized address.
    async fn get(&self, address: &NormalizedAddress) -> Result<Option<Coordinates>, StoreError>;

    /// Insert or replace the coordinates for a normalized address.
    async fn put(
        &self,
        address: &NormalizedAddress,
        coordinates: Coordinates,
    ) -> Result<(), StoreError>;
}

/// Storage for map aggregates.
#[async_trait]
pub trait MapStore: Send + Sync {
    /// Persist a map and all its pins as one atomic unit.
    ///
    /// A map id that already exists fails with [`StoreError::Conflict`]; the
    /// existing map is left untouched.
    async fn create(&self, map: &NewMap, pins: &[ResolvedPin]) -> Result<(), StoreError>;

    /// Fetch a map with its pins in insertion order, counting the view.
    ///
    /// Every successful fetch increments `view_count` atomically. Returns
    /// `None` (and counts nothing) for unknown ids.
    async fn fetch(&self, id: &MapId) -> Result<Option<SharedMap>, StoreError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Map a unique-constraint violation to [`StoreError::Conflict`].
pub(crate) fn conflict_on_unique(message: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return StoreError::Conflict(message.to_owned());
        }
        StoreError::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
