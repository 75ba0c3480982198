//! Per-backend speaker cache.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::speaker::SpeakerCatalog;

/// Holds the last fetched catalog of one backend.
///
/// Readers get an `Arc` snapshot; a refresh swaps the pointer, so a reader
/// never observes a half-replaced catalog. Entries never expire on their own.
/// Fetches are serialized, so concurrent first callers share one fetch.
#[derive(Debug, Default)]
pub struct SpeakerCache {
    current: RwLock<Option<Arc<SpeakerCatalog>>>,
    fetching: Mutex<()>,
}

impl SpeakerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached catalog, if fetched.
    pub fn get(&self) -> Option<Arc<SpeakerCatalog>> {
        self.current.read().clone()
    }

    /// Replaces the cached catalog.
    pub fn replace(&self, catalog: SpeakerCatalog) -> Arc<SpeakerCatalog> {
        let catalog = Arc::new(catalog);
        *self.current.write() = Some(catalog.clone());
        catalog
    }

    /// Returns the cached catalog, or runs `fetch` when the cache is empty
    /// or `force_refresh` is set. A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, force_refresh: bool, fetch: F) -> Result<Arc<SpeakerCatalog>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SpeakerCatalog>>,
    {
        if !force_refresh {
            if let Some(cached) = self.get() {
                return Ok(cached);
            }
        }

        let _fetching = self.fetching.lock().await;
        if !force_refresh {
            // filled while waiting for the lock
            if let Some(cached) = self.get() {
                return Ok(cached);
            }
        }
        let catalog = fetch().await?;
        Ok(self.replace(catalog))
    }
}
