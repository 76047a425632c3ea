//! Test doubles for the geocoding seam.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pinmap_core::{Coordinates, NormalizedAddress, normalize};

use super::{GeocodeProvider, ProviderError};

/// Provider double answering from a fixed table and counting calls.
///
/// Addresses missing from the table yield zero candidates. With
/// `unavailable` set every call fails as if the key were missing.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    answers: HashMap<String, Vec<Coordinates>>,
    unavailable: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, address: &str, candidates: &[(f64, f64)]) -> Self {
        self.answers.insert(
            normalize(address).into_inner(),
            candidates.iter().copied().map(Coordinates::from).collect(),
        );
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for ScriptedProvider {
    async fn geocode(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Vec<Coordinates>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(ProviderError::Unconfigured);
        }
        Ok(self.answers.get(address.as_str()).cloned().unwrap_or_default())
    }
}
