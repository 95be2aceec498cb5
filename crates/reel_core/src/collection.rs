use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{merge_ranked, VideoRecord};

/// Where the next page of a remote listing starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageRequest {
    Offset { offset: usize, limit: usize },
    Cursor { token: String, limit: usize },
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        PageRequest::Offset { offset: 0, limit }
    }

    pub fn limit(&self) -> usize {
        match self {
            PageRequest::Offset { limit, .. } | PageRequest::Cursor { limit, .. } => *limit,
        }
    }
}

/// A persisted, deduplicated and ranked video list for one source key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCollection {
    pub source_key: String,
    pub items: Vec<VideoRecord>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<PageRequest>,
}

impl CachedCollection {
    pub fn empty(source_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            source_key: source_key.into(),
            items: Vec::new(),
            fetched_at: now,
            next_page: None,
        }
    }

    /// Stale once `now` is strictly past `fetched_at + window`.
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.fetched_at.checked_add_signed(window) {
            Some(expires) => now > expires,
            None => false,
        }
    }

    /// Merges a freshly fetched page and stamps the collection with `now`.
    ///
    /// `fetched_at` moves forward even when the page brought nothing new.
    pub fn absorb_page(
        &mut self,
        incoming: Vec<VideoRecord>,
        next_page: Option<PageRequest>,
        now: DateTime<Utc>,
    ) {
        let existing = std::mem::take(&mut self.items);
        self.items = merge_ranked(existing, incoming);
        self.next_page = next_page;
        self.fetched_at = now;
    }

    pub fn visible_slice(&self, count: usize) -> &[VideoRecord] {
        visible_slice(&self.items, count)
    }
}

/// The first `count` items, clamped to the length of `items`.
pub fn visible_slice<T>(items: &[T], count: usize) -> &[T] {
    &items[..count.min(items.len())]
}
