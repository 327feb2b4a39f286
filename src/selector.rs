//! Per-request random selection backed by the image cache.

use log::debug;
use rand::prelude::IteratorRandom;

use crate::{
    catalog::{Catalog, CatalogState, Link, LinkFormatter},
    config::{Config, FailedFetchPolicy, SelectionMode},
    error::{Result, ServeError},
    image_cache::ImageCache,
    media::{HttpFetcher, ImageFetcher, fetch_as_base64},
    s3_index::S3Index,
    types::{GatewayResponse, ImageContentType},
};

/// Draws a catalog index.
pub trait IndexPicker {
    /// Uniform index in `[0, upper)`. `upper` is at least 1.
    fn pick(&self, upper: usize) -> usize;
}

/// Thread-local RNG picker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl IndexPicker for RandomPicker {
    fn pick(&self, upper: usize) -> usize {
        (0..upper).choose(&mut rand::rng()).unwrap_or(0)
    }
}

/// Exclusive upper bound handed to the picker for a catalog of `len` links.
///
/// Legacy mode never reaches the last link, except when it is the only one.
#[must_use]
pub fn selection_bound(mode: SelectionMode, len: usize) -> usize {
    match mode {
        SelectionMode::Full => len,
        SelectionMode::Legacy => len.saturating_sub(1).max(1),
    }
}

/// Process-wide serving state, built once and shared by every invocation.
#[derive(Debug)]
pub struct ImageService<F = HttpFetcher, P = RandomPicker> {
    catalog: CatalogState,
    cache: ImageCache,
    fetcher: F,
    picker: P,
    selection: SelectionMode,
}

impl ImageService {
    /// List the bucket, build the catalog and set up an empty cache.
    ///
    /// A listing failure does not fail startup; it is kept and reported by every invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let index = S3Index::new(&config.s3).await;
        debug!("Listing objects in bucket {}", index.bucket());
        let catalog = CatalogState::load(&index, &LinkFormatter::from_config(&config.s3)).await;
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;

        Ok(Self::new(
            catalog,
            fetcher,
            RandomPicker,
            config.selection,
            config.failed_fetch_policy,
        ))
    }
}

impl<F: ImageFetcher, P: IndexPicker> ImageService<F, P> {
    #[must_use]
    pub fn new(
        catalog: CatalogState,
        fetcher: F,
        picker: P,
        selection: SelectionMode,
        failed_fetch_policy: FailedFetchPolicy,
    ) -> Self {
        Self {
            catalog,
            cache: ImageCache::new(failed_fetch_policy),
            fetcher,
            picker,
            selection,
        }
    }

    /// Serve one invocation. Every failure collapses to a bare status response.
    pub async fn invoke(&self) -> GatewayResponse {
        match self.try_invoke().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Invocation failed: {e}");
                GatewayResponse::failure(e.status_code())
            }
        }
    }

    async fn try_invoke(&self) -> Result<GatewayResponse> {
        let catalog = self.catalog.catalog()?;
        let link = self.select(catalog)?;
        let body = self
            .cache
            .get_or_fetch(link, || fetch_as_base64(&self.fetcher, link))
            .await?;

        Ok(GatewayResponse::image(
            body,
            ImageContentType::from_link(link.as_str()),
        ))
    }

    fn select<'a>(&self, catalog: &'a Catalog) -> Result<&'a Link> {
        let bound = selection_bound(self.selection, catalog.len());
        let index = self.picker.pick(bound).min(catalog.len().saturating_sub(1));
        debug!("Selected index {index} of {}", catalog.len());
        catalog.get(index).ok_or(ServeError::EmptyCatalog)
    }

    #[must_use]
    pub fn catalog_state(&self) -> &CatalogState {
        &self.catalog
    }

    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }
}
