//! In-memory cache of encoded images keyed by link.
//!
//! Entries are never evicted. Each link owns a once-cell, so concurrent misses
//! on the same link share a single fetch.

use std::{collections::HashMap, future::Future, sync::Arc};

use log::{debug, warn};
use tokio::sync::{Mutex, OnceCell};

use crate::{catalog::Link, config::FailedFetchPolicy, error::Result};

#[derive(Debug)]
pub struct ImageCache {
    entries: Mutex<HashMap<Link, Arc<OnceCell<String>>>>,
    failed_fetch_policy: FailedFetchPolicy,
}

impl ImageCache {
    #[must_use]
    pub fn new(failed_fetch_policy: FailedFetchPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            failed_fetch_policy,
        }
    }

    /// Return the cached payload for `link`, running `fetch` on a miss.
    ///
    /// A successful fetch is stored. A failed one is stored as an empty payload
    /// only under [`FailedFetchPolicy::Poison`]; the error is returned either way.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returned if it failed.
    pub async fn get_or_fetch<F, Fut>(&self, link: &Link, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(link.clone()).or_default())
        };

        if let Some(payload) = cell.get() {
            debug!("Image cache HIT for {link}");
            return Ok(payload.clone());
        }

        debug!("Image cache MISS for {link}");
        match cell.get_or_try_init(fetch).await {
            Ok(payload) => Ok(payload.clone()),
            Err(e) => {
                warn!("Fetch failed for {link}: {e}");
                if self.failed_fetch_policy == FailedFetchPolicy::Poison {
                    // Lost races leave whichever payload got there first.
                    let _ = cell.set(String::new());
                }
                Err(e)
            }
        }
    }

    /// Payload currently stored for `link`, if any.
    pub async fn get(&self, link: &Link) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(link).and_then(|cell| cell.get().cloned())
    }

    /// Number of links with a stored payload.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
