use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodeError>;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Network(err.to_string())
    }
}
