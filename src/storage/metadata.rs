/// Request-scoped slot metadata captured around a removal.
///
/// Entries live in the character scope under `placeholder:<item id>` and are
/// expected to exist only between the before and after phase of one removal.

use std::sync::Arc;
use tracing::{debug, warn};

use super::store::{get_typed, set_typed, KeyValueStore};
use crate::types::{ItemId, PlaceholderMetadata};

const KEY_PREFIX: &str = "placeholder:";

#[derive(Clone)]
pub struct MetadataStore {
    store: Arc<dyn KeyValueStore>,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(item: &ItemId) -> String {
        format!("{}{}", KEY_PREFIX, item)
    }

    /// Record metadata for `item`, replacing any stale entry.
    ///
    /// Returns false if the store refused the write; the removal then simply
    /// proceeds without a capture.
    pub fn capture(&self, item: &ItemId, metadata: PlaceholderMetadata) -> bool {
        match set_typed(self.store.as_ref(), &Self::key(item), &metadata) {
            Ok(()) => {
                debug!("[Placeholders] Captured {} at tab {} position {}", item, metadata.tab, metadata.tab_position);
                true
            }
            Err(e) => {
                warn!("[Placeholders] Failed to capture metadata for {}: {}", item, e);
                false
            }
        }
    }

    /// Read and delete the entry for `item`
    pub fn take(&self, item: &ItemId) -> Option<PlaceholderMetadata> {
        let key = Self::key(item);
        let metadata = get_typed(self.store.as_ref(), &key);
        self.remove_key(&key);
        metadata
    }

    /// Delete the entry for `item` if there is one
    pub fn discard(&self, item: &ItemId) {
        let key = Self::key(item);
        if self.store.get(&key).is_some() {
            self.remove_key(&key);
        }
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.store.get(&Self::key(item)).is_some()
    }

    pub fn peek(&self, item: &ItemId) -> Option<PlaceholderMetadata> {
        get_typed(self.store.as_ref(), &Self::key(item))
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("[Placeholders] Failed to drop metadata {:?}: {}", key, e);
        }
    }
}
