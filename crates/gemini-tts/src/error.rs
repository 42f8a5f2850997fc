#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("api key is required")]
    MissingApiKey,
    #[error("invalid api base: {0}")]
    InvalidApiBase(String),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech api returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
