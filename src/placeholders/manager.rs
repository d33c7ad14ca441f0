use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::empties::{AllocatorError, EmptyAllocator, MAX_FILLER_COUNT};
use super::interceptor::RemovalInterceptor;
use super::restoration::append_placeholder;
use crate::bank::{effective_occupied, Bank};
use crate::catalog::Catalog;
use crate::config::{CompletionLogPolicy, PlaceholderSettings};
use crate::notifications::Notifier;
use crate::storage::{MetadataStore, OwnerStorage, StorageError};
use crate::types::{ItemId, RemovalAmount, TabId};

pub type SharedBank = Arc<RwLock<Bank>>;

const EXHAUSTED_NOTIFICATION: &str = "placeholders-empties-exhausted";

#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error(transparent)]
    Allocator(#[from] AllocatorError),
    #[error("tab {0} does not exist")]
    UnknownTab(TabId),
    #[error("item {0} is not in the catalog")]
    UnknownItem(ItemId),
    #[error("item {0} already has a slot")]
    AlreadyInBank(ItemId),
}

/// Entry point wiring placeholders and fillers into a bank
pub struct Placeholders {
    bank: SharedBank,
    catalog: Arc<dyn Catalog>,
    storage: OwnerStorage,
    notifier: Arc<dyn Notifier>,
    settings: Arc<RwLock<PlaceholderSettings>>,
    empties: Arc<EmptyAllocator>,
    interceptor: Arc<RemovalInterceptor>,
    /// Serializes filler allocation across the catalog commit
    allocation: tokio::sync::Mutex<()>,
}

impl Placeholders {
    pub fn new(
        bank: SharedBank,
        catalog: Arc<dyn Catalog>,
        storage: OwnerStorage,
        notifier: Arc<dyn Notifier>,
        settings: PlaceholderSettings,
    ) -> Self {
        Self::with_filler_limit(bank, catalog, storage, notifier, settings, MAX_FILLER_COUNT)
    }

    pub fn with_filler_limit(
        bank: SharedBank,
        catalog: Arc<dyn Catalog>,
        storage: OwnerStorage,
        notifier: Arc<dyn Notifier>,
        settings: PlaceholderSettings,
        filler_limit: u64,
    ) -> Self {
        let settings = Arc::new(RwLock::new(settings));
        let empties = Arc::new(EmptyAllocator::with_limit(
            storage.account().clone(),
            catalog.clone(),
            filler_limit,
        ));
        let interceptor = Arc::new(RemovalInterceptor::new(
            MetadataStore::new(storage.character().clone()),
            empties.clone(),
            settings.clone(),
        ));
        bank.write().register_removal_hook(interceptor.clone());

        Self {
            bank,
            catalog,
            storage,
            notifier,
            settings,
            empties,
            interceptor,
            allocation: tokio::sync::Mutex::new(()),
        }
    }

    /// Run once the catalog is loaded: registers known fillers, migrates
    /// legacy ones and applies catalog default tabs to the bank.
    pub async fn init(&self) -> Result<usize, PlaceholderError> {
        let registered = self.empties.on_catalog_load().await?;

        let mut bank = self.bank.write();
        for definition in self.catalog.definitions() {
            if definition.default_tab != 0 {
                bank.set_default_tab(definition.id, definition.default_tab);
            }
        }
        Ok(registered)
    }

    pub fn bank(&self) -> &SharedBank {
        &self.bank
    }

    pub fn interceptor(&self) -> &Arc<RemovalInterceptor> {
        &self.interceptor
    }

    pub fn empties(&self) -> &Arc<EmptyAllocator> {
        &self.empties
    }

    pub fn settings(&self) -> PlaceholderSettings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, settings: PlaceholderSettings) {
        info!(
            "[Placeholders] Settings updated (only_locked={}, use_slots={}, disabled_tabs={:?})",
            settings.only_locked, settings.use_slots, settings.disabled_tabs
        );
        *self.settings.write() = settings;
    }

    /// The active character changed; forget its session data
    pub fn switch_character(&self) -> Result<(), StorageError> {
        self.storage.switch_character()
    }

    /// Remove quantity through the bank, with interception
    pub fn remove_item(&self, item: &ItemId, amount: RemovalAmount) {
        self.bank.write().remove_item_quantity(item, amount);
    }

    /// Hand out a filler id that no slot currently uses
    pub async fn allocate_filler_id(&self) -> Result<ItemId, AllocatorError> {
        let _guard = self.allocation.lock().await;
        self.next_filler().await
    }

    /// Caller must hold the allocation lock
    async fn next_filler(&self) -> Result<ItemId, AllocatorError> {
        let vacant = {
            let bank = self.bank.read();
            self.empties.find_vacant(|id| bank.contains(id))
        };
        if let Some(id) = vacant {
            debug!("[Empties] Reusing {}", id);
            return Ok(id);
        }

        self.empties.grow().await.map_err(|e| {
            if let AllocatorError::Exhausted { .. } = e {
                self.notifier.error(
                    EXHAUSTED_NOTIFICATION,
                    "No more empty items can be created. Remove some existing empty items first.",
                );
            }
            e
        })
    }

    pub fn vacate_filler(&self, item: &ItemId) {
        self.empties.vacate(item);
    }

    /// Occupied slot count under the current `use_slots` setting
    pub fn effective_occupied(&self) -> usize {
        let use_slots = self.settings.read().use_slots;
        let bank = self.bank.read();
        effective_occupied(bank.occupied_slots(), bank.slots(), use_slots, |id| {
            self.empties.is_filler(id)
        })
    }

    /// Put a new filler at the end of `tab`
    pub async fn create_empty(&self, tab: TabId) -> Result<ItemId, PlaceholderError> {
        if tab >= self.bank.read().tab_count() {
            return Err(PlaceholderError::UnknownTab(tab));
        }

        let _guard = self.allocation.lock().await;
        let id = self.next_filler().await?;

        if !append_placeholder(&mut self.bank.write(), &id, tab, false) {
            return Err(PlaceholderError::UnknownTab(tab));
        }
        info!("[Empties] Created {} in tab {}", id, tab);
        Ok(id)
    }

    /// Give a catalog item that is not in the bank a placeholder
    pub fn add_placeholder(&self, item: &ItemId, tab: Option<TabId>) -> Result<(), PlaceholderError> {
        let definition = self
            .catalog
            .get(item)
            .filter(|d| !d.filler)
            .ok_or_else(|| PlaceholderError::UnknownItem(item.clone()))?;

        let mut bank = self.bank.write();
        if bank.contains(item) {
            return Err(PlaceholderError::AlreadyInBank(item.clone()));
        }
        let tab = tab.unwrap_or_else(|| bank.default_tab(&definition.id));
        if !append_placeholder(&mut bank, item, tab, false) {
            return Err(PlaceholderError::UnknownTab(tab));
        }
        debug!("[Placeholders] Added placeholder for {} in tab {}", item, tab);
        Ok(())
    }

    /// Release every real placeholder, optionally only in one tab
    pub fn release_placeholders(&self, tab: Option<TabId>) -> usize {
        let targets = self.zero_slots(tab, false);
        let mut bank = self.bank.write();
        for item in &targets {
            bank.remove_item_quantity(item, RemovalAmount::All);
        }
        info!("[Placeholders] Released {} placeholder(s)", targets.len());
        targets.len()
    }

    /// Remove every filler, optionally only in one tab
    pub fn remove_empties(&self, tab: Option<TabId>) -> usize {
        let targets = self.zero_slots(tab, true);
        let mut bank = self.bank.write();
        for item in &targets {
            bank.remove_item_quantity(item, RemovalAmount::All);
        }
        info!("[Empties] Removed {} empty item(s)", targets.len());
        targets.len()
    }

    fn zero_slots(&self, tab: Option<TabId>, fillers: bool) -> Vec<ItemId> {
        let guard = self.bank.read();
        let bank: &Bank = &guard;
        let tabs: Vec<TabId> = match tab {
            Some(tab) => vec![tab],
            None => (0..bank.tab_count()).collect(),
        };
        tabs.into_iter()
            .flat_map(move |tab| bank.tab_slots(tab))
            .filter(|slot| slot.quantity == 0 && self.empties.is_filler(&slot.item) == fillers)
            .map(|slot| slot.item.clone())
            .collect()
    }

    /// Add placeholders for completion log items missing from the bank
    pub fn fill_from_completion_log(&self) -> usize {
        let settings = self.settings();
        if settings.completion_log == CompletionLogPolicy::Disabled {
            return 0;
        }

        let definitions = self.catalog.definitions();
        let mut bank = self.bank.write();
        let mut added = 0;
        for definition in definitions {
            if !definition.collectible || definition.filler || bank.contains(&definition.id) {
                continue;
            }
            if settings.completion_log == CompletionLogPolicy::OnlyFound && !bank.has_found(&definition.id) {
                continue;
            }
            let tab = bank.default_tab(&definition.id);
            if settings.is_tab_disabled(tab) {
                continue;
            }
            if append_placeholder(&mut bank, &definition.id, tab, false) {
                added += 1;
            }
        }
        info!("[Placeholders] Added {} placeholder(s) from the completion log", added);
        added
    }
}
