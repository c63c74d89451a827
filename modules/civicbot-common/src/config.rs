use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Persistence
    pub database_url: String,

    // Vision service. Absent key means the image analyzer runs in
    // basic-fallback mode only.
    pub vision_api_key: Option<String>,

    // Geocoding service
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            vision_api_key: env::var("VISION_API_KEY").ok().filter(|k| !k.is_empty()),
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or_else(|_| {
                "CivicBot/1.0 (Community Service Reporting System)".to_string()
            }),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Log the effective configuration without leaking credentials.
    pub fn log_redacted(&self) {
        info!(
            database_url = self.database_url.as_str(),
            vision_api_key = if self.vision_api_key.is_some() {
                "configured"
            } else {
                "absent (basic image analysis only)"
            },
            geocoder_base_url = self.geocoder_base_url.as_str(),
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
