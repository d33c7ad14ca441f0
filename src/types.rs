use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a bank tab
pub type TabId = usize;

/// Identifier of an item definition in the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One position within a bank tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSlot {
    pub item: ItemId,
    /// 0 means the slot is a placeholder (or a filler)
    pub quantity: u64,
    pub tab: TabId,
    /// Always equal to the slot's index in its tab
    pub tab_position: usize,
}

impl BankSlot {
    pub fn is_placeholder(&self) -> bool {
        self.quantity == 0
    }
}

/// Slot snapshot taken right before a removal that may empty it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderMetadata {
    pub tab: TabId,
    #[serde(rename = "tabPosition")]
    pub tab_position: usize,
    pub locked: bool,
    /// The slot was already a placeholder when the removal began, so this is a release
    #[serde(rename = "isPlaceholder")]
    pub is_placeholder: bool,
}

/// How much of an item a removal asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalAmount {
    Exactly(u64),
    /// Remove whatever the slot currently holds
    All,
}

impl RemovalAmount {
    /// Resolve against the quantity currently in the slot
    pub fn resolve(&self, current: u64) -> u64 {
        match self {
            RemovalAmount::Exactly(n) => *n,
            RemovalAmount::All => current,
        }
    }
}

/// Arguments of a single `remove_item_quantity` call, as seen by removal hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub item: ItemId,
    pub amount: RemovalAmount,
}

impl RemovalRequest {
    pub fn new(item: impl Into<ItemId>, amount: RemovalAmount) -> Self {
        Self {
            item: item.into(),
            amount,
        }
    }
}
