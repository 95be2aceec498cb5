use std::sync::Arc;

use reel_core::ProfileLink;
use reel_logging::{reel_info, reel_warn};
use thiserror::Error;

use crate::store::{KeyValueStore, StoreError};

/// Store key of the saved profile link list.
pub const PROFILE_LINKS_KEY: &str = "profileLinks";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid profile link: {0}")]
    Invalid(String),
    #[error("profile link already saved: {0}")]
    Duplicate(String),
    #[error("no profile link at position {0}")]
    OutOfRange(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The user's saved profile links, normalized and free of duplicates.
#[derive(Clone)]
pub struct ProfileLinks {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileLinks {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<String>, LinkError> {
        let Some(text) = self.store.get(PROFILE_LINKS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&text) {
            Ok(links) => Ok(links),
            Err(err) => {
                reel_warn!("Ignoring unreadable saved profile links: {}", err);
                Ok(Vec::new())
            }
        }
    }

    pub fn add(&self, raw: &str) -> Result<ProfileLink, LinkError> {
        let link = ProfileLink::parse(raw).ok_or_else(|| LinkError::Invalid(raw.trim().to_string()))?;
        let mut links = self.list()?;
        if links.iter().any(|saved| saved == link.url()) {
            return Err(LinkError::Duplicate(link.url().to_string()));
        }
        links.push(link.url().to_string());
        self.save(&links)?;
        reel_info!("Saved profile link {}", link.url());
        Ok(link)
    }

    pub fn get(&self, index: usize) -> Result<ProfileLink, LinkError> {
        let links = self.list()?;
        let raw = links.get(index).ok_or(LinkError::OutOfRange(index))?;
        ProfileLink::parse(raw).ok_or_else(|| LinkError::Invalid(raw.clone()))
    }

    pub fn remove(&self, index: usize) -> Result<String, LinkError> {
        let mut links = self.list()?;
        if index >= links.len() {
            return Err(LinkError::OutOfRange(index));
        }
        let removed = links.remove(index);
        self.save(&links)?;
        reel_info!("Removed profile link {}", removed);
        Ok(removed)
    }

    fn save(&self, links: &[String]) -> Result<(), LinkError> {
        let text = serde_json::to_string(links).map_err(StoreError::from)?;
        self.store.set(PROFILE_LINKS_KEY, &text)?;
        Ok(())
    }
}
