use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::error::Result;
use crate::FetchedPage;

/// URL-keyed memo of successful fetches, shared by every stage for the
/// lifetime of one run. Concurrent requests for the same URL coalesce:
/// at most one network fetch runs per URL, the rest await its result.
/// No eviction; run sizes are bounded by the page budget.
pub struct PageCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Arc<FetchedPage>>>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached page for `url`, or the result of `fetch`, memoized on success.
    /// A failed fetch is not cached; the next caller for the URL retries.
    pub async fn get_or_fetch<F, Fut>(&self, url: &str, fetch: F) -> Result<Arc<FetchedPage>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<FetchedPage>>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(url.to_string()).or_default().clone()
        };
        cell.get_or_try_init(fetch).await.cloned()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}
