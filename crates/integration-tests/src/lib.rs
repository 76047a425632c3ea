//! Integration tests for Pinmap.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations to the test database
//! cargo run -p pinmap-cli -- migrate
//!
//! # Start the server (for the HTTP tests)
//! cargo run -p pinmap-server
//!
//! # Run the ignored integration tests
//! cargo test -p pinmap-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `maps_api` - HTTP tests against a running server
//! - `postgres_store` - `PostgreSQL` store and cache tests
//!
//! # Environment Variables
//!
//! - `PINMAP_BASE_URL` - server under test (default `http://localhost:8000`)
//! - `PINMAP_DATABASE_URL` (or `DATABASE_URL`) - migrated test database

use chrono::Utc;
use pinmap_core::MapId;
use reqwest::Client;
use secrecy::SecretString;
use sqlx::PgPool;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("PINMAP_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// HTTP client for the API under test.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the migrated test database.
///
/// # Panics
///
/// Panics if no database URL is configured or the connection fails.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("PINMAP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("PINMAP_DATABASE_URL must be set for integration tests");

    pinmap_server::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// A map id that will not collide with ids from earlier runs.
///
/// # Panics
///
/// Panics if the clock is outside the range `chrono` can express in nanoseconds.
#[must_use]
pub fn unique_map_id(prefix: &str) -> MapId {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .expect("timestamp out of range");
    MapId::parse(&format!("{prefix}{nanos:x}")).expect("generated id is valid")
}
