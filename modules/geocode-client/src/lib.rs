pub mod error;

pub use error::{GeocodeError, Result};

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Client for a Nominatim-style free-text geocoding endpoint.
/// One query in, zero or one best-match coordinate pair out.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up a free-text place description. `Ok(None)` means the service
    /// answered but found nothing.
    pub async fn search(&self, query: &str) -> Result<Option<(f64, f64)>> {
        let endpoint = format!("{}/search", self.base_url);

        let resp = self
            .client
            .get(&endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header("Accept-Language", "en")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let places: Vec<Place> = resp.json().await?;
        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let lat = place
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::Parse(format!("bad latitude {:?}: {e}", place.lat)))?;
        let lng = place
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::Parse(format!("bad longitude {:?}: {e}", place.lon)))?;

        Ok(Some((lat, lng)))
    }
}
