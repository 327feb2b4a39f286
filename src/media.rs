//! Image retrieval and base64 encoding.

use std::{future::Future, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use reqwest::Client;

use crate::{
    catalog::Link,
    error::{Result, ServeError},
};

/// Retrieves the raw bytes behind a link.
pub trait ImageFetcher {
    fn fetch(&self, link: &Link) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Plain HTTP GET against the public link.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, link: &Link) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(link.as_str())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_failed(link, &e))?;

        let bytes = response.bytes().await.map_err(|e| fetch_failed(link, &e))?;
        debug!("Fetched {} bytes from {link}", bytes.len());
        Ok(bytes.to_vec())
    }
}

fn fetch_failed(link: &Link, error: &reqwest::Error) -> ServeError {
    ServeError::FetchFailed {
        url: link.to_string(),
        message: error.to_string(),
    }
}

/// Standard padded base64, as the gateway decodes it.
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Fetch a link and encode its bytes.
///
/// # Errors
///
/// Returns [`ServeError::FetchFailed`] if retrieval fails.
pub async fn fetch_as_base64<F: ImageFetcher>(fetcher: &F, link: &Link) -> Result<String> {
    let bytes = fetcher.fetch(link).await?;
    Ok(encode_base64(&bytes))
}
