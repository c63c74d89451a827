use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use civicbot_common::GeoPoint;
use civicbot_nlp::UNKNOWN_LOCATION;
use geocode_client::NominatimClient;

/// The geocoding collaborator, abstracted so tests can count calls and
/// script answers.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for std::sync::Arc<G> {
    async fn search(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>> {
        (**self).search(query).await
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>> {
        Ok(NominatimClient::search(self, query).await?)
    }
}

/// Resolves extracted location text to coordinates, caching every outcome
/// (including "not found") for the life of the process.
pub struct LocationResolver<G> {
    geocoder: G,
    cache: RwLock<HashMap<String, Option<GeoPoint>>>,
}

impl<G: Geocoder> LocationResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a location. The `Unknown` sentinel and empty text short-circuit
    /// to absent without touching the collaborator; network failures are soft
    /// (logged, cached as not-found, never raised).
    pub async fn resolve(&self, location_text: &str) -> Option<GeoPoint> {
        let trimmed = location_text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_LOCATION) {
            return None;
        }

        let key = trimmed.to_lowercase();
        if let Some(cached) = self.cache.read().await.get(&key) {
            debug!(location = trimmed, hit = cached.is_some(), "Geocode cache hit");
            return *cached;
        }

        // Miss: ask the collaborator with the raw (non-normalized) text.
        let result = match self.geocoder.search(location_text).await {
            Ok(Some((lat, lng))) => {
                info!(location = trimmed, lat, lng, "Geocoded location");
                Some(GeoPoint { lat, lng })
            }
            Ok(None) => {
                debug!(location = trimmed, "Geocoder found no match");
                None
            }
            Err(e) => {
                warn!(error = %e, location = trimmed, "Geocoding failed, storing report without coordinates");
                None
            }
        };

        self.cache.write().await.insert(key, result);
        result
    }
}
