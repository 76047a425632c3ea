//! CLI subcommands.

pub mod geocode;
pub mod migrate;
pub mod normalize;

use secrecy::SecretString;

/// Read the database URL, preferring `PINMAP_DATABASE_URL` over `DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("PINMAP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
