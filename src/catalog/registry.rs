/// Item catalog
///
/// New definitions are collected into a `DataPackage` and committed as one
/// asynchronous transaction, mirroring how game data packages are registered.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{ItemId, TabId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog no longer accepts new definitions")]
    Sealed,
    #[error("item {0} is already registered")]
    Duplicate(ItemId),
}

/// Definition of an item kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub sell_price: u64,
    /// Tracked by the completion log
    #[serde(default = "default_true")]
    pub collectible: bool,
    #[serde(default = "default_true")]
    pub stackable: bool,
    /// Synthetic slot filler
    #[serde(default)]
    pub filler: bool,
    #[serde(default)]
    pub default_tab: TabId,
}

fn default_true() -> bool {
    true
}

impl ItemDefinition {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sell_price: 0,
            collectible: true,
            stackable: true,
            filler: false,
            default_tab: 0,
        }
    }

    /// Zero-value, non-collectible, non-stackable filler record
    pub fn filler(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: String::from("Empty"),
            sell_price: 0,
            collectible: false,
            stackable: false,
            filler: true,
            default_tab: 0,
        }
    }

    pub fn with_sell_price(mut self, sell_price: u64) -> Self {
        self.sell_price = sell_price;
        self
    }

    pub fn in_tab(mut self, tab: TabId) -> Self {
        self.default_tab = tab;
        self
    }
}

/// Definitions waiting to be committed together
#[derive(Debug, Default, Clone)]
pub struct DataPackage {
    items: Vec<ItemDefinition>,
}

/// Handed to the closure passed to [`DataPackage::build`]
#[derive(Debug, Default)]
pub struct PackageBuilder {
    items: Vec<ItemDefinition>,
}

impl PackageBuilder {
    pub fn add(&mut self, definition: ItemDefinition) {
        self.items.push(definition);
    }
}

impl DataPackage {
    pub fn build<F>(builder: F) -> Self
    where
        F: FnOnce(&mut PackageBuilder),
    {
        let mut package = PackageBuilder::default();
        builder(&mut package);
        Self {
            items: package.items,
        }
    }

    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    fn get(&self, id: &ItemId) -> Option<ItemDefinition>;

    fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Every registered definition, in registration order
    fn definitions(&self) -> Vec<ItemDefinition>;

    /// Register every definition in `package`, or none of them
    async fn commit(&self, package: DataPackage) -> Result<(), CatalogError>;
}

/// Catalog held in memory
#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, ItemDefinition>>,
    order: RwLock<Vec<ItemId>>,
    sealed: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        let catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    fn insert(&self, definition: ItemDefinition) {
        let id = definition.id.clone();
        if self.items.write().insert(id.clone(), definition).is_none() {
            self.order.write().push(id);
        }
    }

    /// Refuse any further commits
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn unseal(&self) {
        self.sealed.store(false, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.order.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.read().is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    fn get(&self, id: &ItemId) -> Option<ItemDefinition> {
        self.items.read().get(id).cloned()
    }

    fn definitions(&self) -> Vec<ItemDefinition> {
        let items = self.items.read();
        self.order
            .read()
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect()
    }

    async fn commit(&self, package: DataPackage) -> Result<(), CatalogError> {
        if self.sealed.load(Ordering::SeqCst) {
            return Err(CatalogError::Sealed);
        }

        {
            let items = self.items.read();
            let mut seen = std::collections::HashSet::new();
            for definition in package.items() {
                if items.contains_key(&definition.id) || !seen.insert(&definition.id) {
                    return Err(CatalogError::Duplicate(definition.id.clone()));
                }
            }
        }

        let count = package.len();
        for definition in package.items {
            debug!("[Catalog] Registering {}", definition.id);
            self.insert(definition);
        }
        info!("[Catalog] Committed package with {} definition(s)", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_registers_package() {
        let catalog = InMemoryCatalog::new();
        let package = DataPackage::build(|p| {
            p.add(ItemDefinition::filler("empty_i_0"));
            p.add(ItemDefinition::filler("empty_i_1"));
        });
        catalog.commit(package).await.unwrap();

        let empty = catalog.get(&ItemId::from("empty_i_1")).unwrap();
        assert!(empty.filler);
        assert!(!empty.collectible);
        assert!(!empty.stackable);
        assert_eq!(empty.sell_price, 0);
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let catalog = InMemoryCatalog::with_items([ItemDefinition::new("bones", "Bones")]);
        let package = DataPackage::build(|p| {
            p.add(ItemDefinition::new("feathers", "Feathers"));
            p.add(ItemDefinition::new("bones", "Bones"));
        });

        assert_eq!(
            catalog.commit(package).await,
            Err(CatalogError::Duplicate(ItemId::from("bones")))
        );
        assert!(!catalog.contains(&ItemId::from("feathers")));
    }

    #[tokio::test]
    async fn test_sealed_catalog_rejects_commits() {
        let catalog = InMemoryCatalog::new();
        catalog.seal();
        let package = DataPackage::build(|p| p.add(ItemDefinition::filler("empty_i_0")));
        assert_eq!(catalog.commit(package.clone()).await, Err(CatalogError::Sealed));

        catalog.unseal();
        assert!(catalog.commit(package).await.is_ok());
    }

    #[test]
    fn test_definitions_keep_registration_order() {
        let catalog = InMemoryCatalog::with_items([
            ItemDefinition::new("c", "C"),
            ItemDefinition::new("a", "A"),
            ItemDefinition::new("b", "B"),
        ]);
        let ids: Vec<_> = catalog.definitions().into_iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
