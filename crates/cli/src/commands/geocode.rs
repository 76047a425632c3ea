//! Geocode cache warming.
//!
//! Resolves each address through the same pipeline the server uses, so hits
//! come from the cache and misses are fetched from the provider and cached.
//!
//! # Usage
//!
//! ```bash
//! pinmap-cli geocode "東京都千代田区1-1" "大阪府大阪市北区梅田3-1-1"
//! ```

use std::sync::Arc;

use pinmap_server::config::{ConfigError, PinmapConfig};
use pinmap_server::db::{PgGeocodeCache, create_pool};
use pinmap_server::geocoding::{GeocodeResolver, GoogleGeocoder, ProviderError};
use thiserror::Error;

/// Errors that stop the command before any address is resolved.
#[derive(Debug, Error)]
pub enum GeocodeCommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The provider client could not be built.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// At least one address failed to resolve.
    #[error("{failed} of {total} addresses failed to resolve")]
    Failed { failed: usize, total: usize },
}

/// Resolve addresses and print `normalized<TAB>lat,lng` for each.
///
/// # Errors
///
/// Returns an error if setup fails or any address could not be resolved.
pub async fn run(addresses: &[String]) -> Result<(), GeocodeCommandError> {
    let config = PinmapConfig::from_env()?;
    if config.geocoding.api_key.is_none() {
        tracing::warn!("GOOGLE_GEOCODING_KEY is not set; only cached addresses will resolve");
    }

    let pool = create_pool(&config.database_url).await?;
    let provider = GoogleGeocoder::new(&config.geocoding)?;
    let resolver = GeocodeResolver::new(
        Arc::new(PgGeocodeCache::new(pool)),
        Arc::new(provider),
        config.geocoding.memo_capacity,
    );

    let mut failed = 0;
    for raw in addresses {
        match resolver.resolve(raw).await {
            Ok(resolution) => {
                #[allow(clippy::print_stdout)]
                {
                    println!(
                        "{}\t{},{}",
                        resolution.address, resolution.coordinates.lat, resolution.coordinates.lng
                    );
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(address = %raw, error = %e, "Failed to resolve address");
            }
        }
    }

    if failed > 0 {
        return Err(GeocodeCommandError::Failed {
            failed,
            total: addresses.len(),
        });
    }
    Ok(())
}
