use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("S3 listing error: {0}")]
    S3List(String),

    #[error("Image catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Image catalog is empty")]
    EmptyCatalog,

    #[error("Failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    /// Status reported to the invoker. Failures are never described beyond this.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

pub type Result<T> = std::result::Result<T, ServeError>;
