use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reel_core::{CachedCollection, PageRequest, SourceKey};
use reel_logging::{reel_debug, reel_info, reel_warn};

use crate::client::VideoSource;
use crate::store::KeyValueStore;
use crate::CacheError;

/// Source of "now" for freshness decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Persisted collections older than this are refetched on `load`.
    pub freshness_window: Duration,
    /// Page size requested from the backend.
    pub page_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(3 * 24 * 60 * 60),
            page_size: 20,
        }
    }
}

/// Incremental, persisted cache of ranked video lists.
///
/// Each source key maps to one [`CachedCollection`] in the key-value store.
/// Fetched pages are merged into what is already stored, never swapped in, so
/// videos seen once stay listed. Calls for the same key are serialized.
pub struct ListCache {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn KeyValueStore>,
    settings: CacheSettings,
    clock: Clock,
    views: Mutex<HashMap<String, CachedCollection>>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ListCache {
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn KeyValueStore>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            source,
            store,
            settings,
            clock: Arc::new(Utc::now),
            views: Mutex::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn first_page(&self) -> PageRequest {
        PageRequest::first(self.settings.page_size)
    }

    /// Serves the persisted collection while it is fresh; otherwise fetches
    /// `page` and merges it in.
    pub async fn load(
        &self,
        source: &SourceKey,
        page: PageRequest,
    ) -> Result<CachedCollection, CacheError> {
        let key = source.storage_key();
        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        let persisted = self.read_persisted(&key)?;
        if let Some(collection) = &persisted {
            let now = (self.clock)();
            if !collection.is_stale(now, self.window()) {
                reel_debug!(
                    "Serving {} cached videos for {}",
                    collection.items.len(),
                    key
                );
                self.remember(&key, collection.clone());
                return Ok(collection.clone());
            }
            reel_info!(
                "Cached videos for {} are stale (fetched {}); refetching",
                key,
                collection.fetched_at
            );
        }

        self.fetch_and_merge(source, &key, page, persisted).await
    }

    /// Always fetches `page` and merges it in, regardless of freshness.
    pub async fn load_more(
        &self,
        source: &SourceKey,
        page: PageRequest,
    ) -> Result<CachedCollection, CacheError> {
        let key = source.storage_key();
        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        let persisted = self.read_persisted(&key)?;
        self.fetch_and_merge(source, &key, page, persisted).await
    }

    /// Drops the in-memory view of `source`; persisted data is kept.
    pub fn invalidate(&self, source: &SourceKey) {
        let key = source.storage_key();
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        if views.remove(&key).is_some() {
            reel_debug!("Invalidated in-memory videos for {}", key);
        }
    }

    /// The collection last produced for `source` in this session.
    pub fn view(&self, source: &SourceKey) -> Option<CachedCollection> {
        let views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        views.get(&source.storage_key()).cloned()
    }

    async fn fetch_and_merge(
        &self,
        source: &SourceKey,
        key: &str,
        page: PageRequest,
        persisted: Option<CachedCollection>,
    ) -> Result<CachedCollection, CacheError> {
        let fetched = match self.source.fetch_page(source, &page).await {
            Ok(fetched) => fetched,
            Err(error) => {
                reel_warn!("Fetching videos for {} failed: {}", key, error);
                return Err(CacheError::Fetch {
                    error,
                    retained: persisted,
                });
            }
        };

        let now = (self.clock)();
        let incoming = fetched.items.len();
        let mut collection = persisted.unwrap_or_else(|| CachedCollection::empty(key, now));
        let before = collection.items.len();
        collection.absorb_page(fetched.items, fetched.next_page, now);
        reel_info!(
            "Merged {} fetched videos into {} ({} -> {} items)",
            incoming,
            key,
            before,
            collection.items.len()
        );

        let serialized = serde_json::to_string(&collection).map_err(crate::StoreError::from)?;
        self.store.set(key, &serialized)?;
        self.remember(key, collection.clone());
        Ok(collection)
    }

    fn read_persisted(&self, key: &str) -> Result<Option<CachedCollection>, CacheError> {
        let Some(text) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(collection) => Ok(Some(collection)),
            Err(err) => {
                reel_warn!("Ignoring unreadable cached videos for {}: {}", key, err);
                Ok(None)
            }
        }
    }

    fn remember(&self, key: &str, collection: CachedCollection) {
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        views.insert(key.to_string(), collection);
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    fn window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.freshness_window)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100))
    }
}
