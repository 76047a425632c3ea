//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pinmap-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PINMAP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at compile
//! time.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the server's database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url =
        super::database_url().ok_or(MigrationError::MissingEnvVar("PINMAP_DATABASE_URL"))?;

    tracing::info!("Connecting to pinmap database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running pinmap migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Pinmap migrations complete!");
    Ok(())
}
