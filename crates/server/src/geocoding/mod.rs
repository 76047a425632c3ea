//! Address geocoding.
//!
//! # Architecture
//!
//! - [`GeocodeProvider`] is the external capability: normalized address in,
//!   ranked coordinate candidates out. [`GoogleGeocoder`] is the production
//!   implementation.
//! - [`GeocodeResolver`] is the pipeline every pin goes through: normalize,
//!   consult the durable cache, fall back to the provider on a miss and write
//!   the result back.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinmap_server::geocoding::{GeocodeResolver, GoogleGeocoder};
//!
//! let provider = GoogleGeocoder::new(&config.geocoding)?;
//! let resolver = GeocodeResolver::new(Arc::new(cache), Arc::new(provider), 10_000);
//!
//! let resolution = resolver.resolve("東京都千代田区１−１").await?;
//! assert_eq!(resolution.address.as_str(), "東京都千代田区1-1");
//! ```

mod google;
mod resolver;
#[cfg(test)]
pub(crate) mod testing;

pub use google::GoogleGeocoder;
pub use resolver::{GeocodeResolver, ResolveError, Resolution};

use async_trait::async_trait;
use pinmap_core::{Coordinates, NormalizedAddress};
use thiserror::Error;

/// Errors that can occur when talking to a geocoding provider.
///
/// "No match" is not an error: providers return an empty candidate list.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured.
    #[error("geocoding provider is not configured")]
    Unconfigured,

    /// HTTP request failed (connect, timeout, body read).
    ///
    /// The request URL is stripped: it carries the API key.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Provider answered with a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider refused the request (quota, invalid key, ...).
    #[error("request rejected with status {status}: {}", message.as_deref().unwrap_or("no details"))]
    Rejected {
        /// Provider status code, e.g. `OVER_QUERY_LIMIT`.
        status: String,
        /// Provider supplied explanation.
        message: Option<String>,
    },

    /// Response body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// Resolves normalized addresses to coordinates.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Geocode an address.
    ///
    /// Returns candidates best first; an empty list means the provider found
    /// nothing.
    async fn geocode(&self, address: &NormalizedAddress) -> Result<Vec<Coordinates>, ProviderError>;
}
