/// Filler ("empty") item ids
///
/// Fillers are named `empty_i_<k>` for every `k` below the persisted
/// `countEmpties`. The namespace only ever grows: ids are never unregistered,
/// but a filler whose slot was vacated is handed out again before the
/// namespace grows. Ids minted by the old ad hoc scheme are kept in
/// `legacyEmpties` so saves that reference them still resolve.

use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, DataPackage, ItemDefinition};
use crate::storage::{get_typed, set_typed, KeyValueStore, StorageError};
use crate::types::ItemId;

pub const EMPTY_PREFIX: &str = "empty_i_";

/// How many filler ids are registered whenever the namespace grows
pub const GROWTH_BATCH: u64 = 10;

/// Hard ceiling on the number of filler ids
pub const MAX_FILLER_COUNT: u64 = 1_000_000;

const COUNT_KEY: &str = "countEmpties";
const LEGACY_KEY: &str = "legacyEmpties";

#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("all {count} filler ids are in use and the limit of {limit} is reached")]
    Exhausted { count: u64, limit: u64 },
    #[error("failed to register filler items: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to persist filler state: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Default)]
struct EmptyState {
    count: u64,
    legacy: Vec<ItemId>,
}

pub struct EmptyAllocator {
    account: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn Catalog>,
    limit: u64,
    state: RwLock<EmptyState>,
}

impl EmptyAllocator {
    /// Load `countEmpties` and `legacyEmpties` from account storage
    pub fn new(account: Arc<dyn KeyValueStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self::with_limit(account, catalog, MAX_FILLER_COUNT)
    }

    pub fn with_limit(account: Arc<dyn KeyValueStore>, catalog: Arc<dyn Catalog>, limit: u64) -> Self {
        let count: u64 = get_typed(account.as_ref(), COUNT_KEY).unwrap_or(0);
        let legacy: Vec<ItemId> = get_typed(account.as_ref(), LEGACY_KEY).unwrap_or_default();
        debug!("[Empties] Loaded count={} legacy={}", count, legacy.len());

        Self {
            account,
            catalog,
            limit,
            state: RwLock::new(EmptyState { count, legacy }),
        }
    }

    pub fn filler_id(index: u64) -> ItemId {
        ItemId::new(format!("{}{}", EMPTY_PREFIX, index))
    }

    /// Index of a canonical `empty_i_<k>` id; `empty_i_05` or `empty_i_+5` are not fillers
    fn filler_index(item: &ItemId) -> Option<u64> {
        let index: u64 = item.as_str().strip_prefix(EMPTY_PREFIX)?.parse().ok()?;
        (Self::filler_id(index) == *item).then_some(index)
    }

    pub fn count(&self) -> u64 {
        self.state.read().count
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn legacy(&self) -> Vec<ItemId> {
        self.state.read().legacy.clone()
    }

    /// Whether `item` belongs to the filler namespace
    pub fn is_filler(&self, item: &ItemId) -> bool {
        let state = self.state.read();
        match Self::filler_index(item) {
            Some(index) if index < state.count => true,
            _ => state.legacy.contains(item),
        }
    }

    /// Lowest-index filler id that `occupied` does not claim
    pub fn find_vacant<F>(&self, occupied: F) -> Option<ItemId>
    where
        F: Fn(&ItemId) -> bool,
    {
        let count = self.count();
        (0..count)
            .map(Self::filler_id)
            .find(|id| !occupied(id))
    }

    /// Register every known filler the catalog does not have yet.
    ///
    /// Run once per catalog load: re-registers `empty_i_0..countEmpties` and
    /// migrates legacy ids under their original names.
    pub async fn on_catalog_load(&self) -> Result<usize, AllocatorError> {
        let (count, legacy) = {
            let state = self.state.read();
            (state.count, state.legacy.clone())
        };

        let missing: Vec<ItemId> = (0..count)
            .map(Self::filler_id)
            .chain(legacy)
            .filter(|id| !self.catalog.contains(id))
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        let registered = missing.len();
        let package = DataPackage::build(|p| {
            for id in missing {
                p.add(ItemDefinition::filler(id));
            }
        });
        self.catalog.commit(package).await?;
        info!("[Empties] Registered {} filler definition(s) on load", registered);
        Ok(registered)
    }

    /// Extend the namespace by one batch and return the first new id.
    ///
    /// The count only advances once the catalog accepted the batch and the new
    /// count is persisted. Ids a failed attempt already registered are not
    /// registered again on retry.
    pub async fn grow(&self) -> Result<ItemId, AllocatorError> {
        let count = self.count();
        if count >= self.limit {
            return Err(AllocatorError::Exhausted {
                count,
                limit: self.limit,
            });
        }
        let new_count = count.saturating_add(GROWTH_BATCH).min(self.limit);

        let missing: Vec<ItemId> = (count..new_count)
            .map(Self::filler_id)
            .filter(|id| !self.catalog.contains(id))
            .collect();
        if !missing.is_empty() {
            let package = DataPackage::build(|p| {
                for id in missing {
                    p.add(ItemDefinition::filler(id));
                }
            });
            self.catalog.commit(package).await?;
        }

        set_typed(self.account.as_ref(), COUNT_KEY, &new_count)?;
        self.state.write().count = new_count;
        info!("[Empties] Grew filler namespace {} -> {}", count, new_count);
        Ok(Self::filler_id(count))
    }

    /// Called once a filler's slot is gone.
    ///
    /// Indexed ids stay registered for reuse. Legacy ids are dropped from
    /// account storage.
    pub fn vacate(&self, item: &ItemId) {
        let legacy = {
            let mut state = self.state.write();
            let before = state.legacy.len();
            state.legacy.retain(|id| id != item);
            if state.legacy.len() == before {
                None
            } else {
                Some(state.legacy.clone())
            }
        };

        match legacy {
            Some(remaining) => {
                if let Err(e) = set_typed(self.account.as_ref(), LEGACY_KEY, &remaining) {
                    warn!("[Empties] Failed to forget legacy filler {}: {}", item, e);
                } else {
                    info!("[Empties] Dropped legacy filler {} ({} left)", item, remaining.len());
                }
            }
            None => debug!("[Empties] {} vacated, kept for reuse", item),
        }
    }
}
