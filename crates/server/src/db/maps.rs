//! `PostgreSQL` map store.
//!
//! A map and its pins are written in one transaction, so readers never see a
//! map without its pins. Pins come back ordered by their serial id, which
//! follows insertion order inside that transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pinmap_core::{MapId, NewMap, Pin, ResolvedPin, SharedMap};
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::{MapStore, StoreError, conflict_on_unique};

/// Map store backed by the `pinmap.maps` and `pinmap.pins` tables.
#[derive(Clone)]
pub struct PgMapStore {
    pool: PgPool,
}

impl PgMapStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MapRow {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    owner: Option<String>,
    view_count: i64,
}

#[derive(sqlx::FromRow)]
struct PinRow {
    name: String,
    address: String,
    lat: f64,
    lng: f64,
    note: String,
}

impl From<PinRow> for Pin {
    fn from(row: PinRow) -> Self {
        Self {
            name: row.name,
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            note: row.note,
        }
    }
}

#[async_trait]
impl MapStore for PgMapStore {
    #[instrument(skip(self, map, pins), fields(map_id = %map.id, pins = pins.len()))]
    async fn create(&self, map: &NewMap, pins: &[ResolvedPin]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO pinmap.maps (id, title, created_at, expires_at, owner, view_count)
            VALUES ($1, $2, $3, NULL, NULL, 0)
            ",
        )
        .bind(&map.id)
        .bind(&map.title)
        .bind(map.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conflict_on_unique("map id already exists"))?;

        for pin in pins {
            sqlx::query(
                r"
                INSERT INTO pinmap.pins (map_id, name, address, lat, lng, note)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(&map.id)
            .bind(&pin.name)
            .bind(&pin.address)
            .bind(pin.coordinates.lat)
            .bind(pin.coordinates.lng)
            .bind(&pin.note)
            .execute(&mut *tx)
            .await?;
        }

        // Dropping `tx` on any error above rolls everything back
        tx.commit().await?;

        debug!("Map persisted");
        Ok(())
    }

    #[instrument(skip(self, id), fields(map_id = %id))]
    async fn fetch(&self, id: &MapId) -> Result<Option<SharedMap>, StoreError> {
        // Counting the view and reading the row is one statement, so
        // concurrent fetches never lose an increment.
        let row: Option<MapRow> = sqlx::query_as(
            r"
            UPDATE pinmap.maps
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING id, title, created_at, expires_at, owner, view_count
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let pins: Vec<PinRow> = sqlx::query_as(
            r"
            SELECT name, address, lat, lng, COALESCE(note, '') AS note
            FROM pinmap.pins
            WHERE map_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let map_id = MapId::parse(&row.id)
            .map_err(|e| StoreError::DataCorruption(format!("invalid map id in database: {e}")))?;

        Ok(Some(SharedMap {
            id: map_id,
            title: row.title,
            created_at: row.created_at,
            expires_at: row.expires_at,
            owner: row.owner,
            view_count: row.view_count,
            pins: pins.into_iter().map(Pin::from).collect(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
