//! Google Geocoding API client.
//!
//! Uses the JSON endpoint
//! (`GET {endpoint}?address=...&key=...`). Only the top-level `status` and each
//! result's `geometry.location` are read.

use async_trait::async_trait;
use pinmap_core::{Coordinates, NormalizedAddress};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{GeocodeProvider, ProviderError};
use crate::config::GeocodingConfig;

/// Status returned when the address matched at least one place.
const STATUS_OK: &str = "OK";

/// Status returned for a well-formed request that matched nothing.
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    /// Create a new client.
    ///
    /// A missing API key is allowed: every lookup then fails with
    /// [`ProviderError::Unconfigured`], which still lets cached addresses
    /// resolve.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not a valid URL or the HTTP client
    /// fails to build.
    pub fn new(config: &GeocodingConfig) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::Parse(format!("invalid endpoint: {e}")))?;

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_url(&self, address: &NormalizedAddress, key: &SecretString) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", address.as_str())
            .append_pair("key", key.expose_secret());
        url
    }
}

#[async_trait]
impl GeocodeProvider for GoogleGeocoder {
    #[instrument(skip(self, address), fields(address = %address))]
    async fn geocode(&self, address: &NormalizedAddress) -> Result<Vec<Coordinates>, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::Unconfigured)?;

        let response = self.client.get(self.request_url(address, key)).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Geocoding API returned non-success status"
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let candidates = parse_response(&body)?;
        debug!(candidates = candidates.len(), "Geocoding API responded");
        Ok(candidates)
    }
}

/// Turn a Geocoding API JSON body into ranked candidates.
fn parse_response(body: &str) -> Result<Vec<Coordinates>, ProviderError> {
    let response: GeocodeResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse geocoding response"
        );
        ProviderError::Parse(e.to_string())
    })?;

    match response.status.as_str() {
        STATUS_OK => Ok(response
            .results
            .into_iter()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))
            .collect()),
        STATUS_ZERO_RESULTS => Ok(Vec::new()),
        _ => Err(ProviderError::Rejected {
            status: response.status,
            message: response.error_message,
        }),
    }
}
