pub mod error;
pub mod types;

pub use error::{Result, VisionError};
pub use types::{AnnotateResult, LabelAnnotation, ObjectAnnotation, SafeSearchAnnotation};

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use types::AnnotateResponse;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com/v1";

pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Download an image payload (e.g. a messaging-channel media URL).
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    /// Run label, object, and safe-search detection over an image payload.
    pub async fn annotate(&self, image: &[u8]) -> Result<AnnotateResult> {
        let endpoint = format!("{}/images:annotate?key={}", self.base_url, self.api_key);

        let body = serde_json::json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [
                    { "type": "LABEL_DETECTION", "maxResults": 10 },
                    { "type": "OBJECT_LOCALIZATION", "maxResults": 10 },
                    { "type": "SAFE_SEARCH_DETECTION", "maxResults": 5 }
                ]
            }]
        });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnnotateResponse = resp.json().await?;
        Ok(parsed.responses.into_iter().next().unwrap_or_default())
    }
}
