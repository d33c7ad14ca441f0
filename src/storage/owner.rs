use std::sync::Arc;
use tracing::info;

use super::store::{KeyValueStore, MemoryStore, StorageError};

/// Storage split by owner: the character scope is wiped whenever the active
/// character changes, the account scope survives.
#[derive(Clone)]
pub struct OwnerStorage {
    character: Arc<dyn KeyValueStore>,
    account: Arc<dyn KeyValueStore>,
}

impl OwnerStorage {
    pub fn new(character: Arc<dyn KeyValueStore>, account: Arc<dyn KeyValueStore>) -> Self {
        Self { character, account }
    }

    /// Both scopes held in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn character(&self) -> &Arc<dyn KeyValueStore> {
        &self.character
    }

    pub fn account(&self) -> &Arc<dyn KeyValueStore> {
        &self.account
    }

    /// Drop everything scoped to the previous character
    pub fn switch_character(&self) -> Result<(), StorageError> {
        self.character.clear()?;
        info!("[Storage] Character scope cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_switch_character_keeps_account_scope() {
        let storage = OwnerStorage::in_memory();
        storage.character().set("session", json!(1)).unwrap();
        storage.account().set("countEmpties", json!(10)).unwrap();

        storage.switch_character().unwrap();

        assert!(storage.character().get("session").is_none());
        assert_eq!(storage.account().get("countEmpties"), Some(json!(10)));
    }
}
