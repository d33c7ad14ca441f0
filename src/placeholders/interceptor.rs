/// Removal interception
///
/// The before phase snapshots a slot that may be emptied by the removal. The
/// after phase decides whether the emptied slot comes back as a placeholder.
/// Every capture is consumed by the after phase of the same removal,
/// whichever branch it takes.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use super::empties::EmptyAllocator;
use super::restoration::restore_placeholder;
use crate::bank::{Bank, RemovalHook};
use crate::config::PlaceholderSettings;
use crate::storage::MetadataStore;
use crate::types::{ItemId, PlaceholderMetadata, RemovalAmount, RemovalRequest};

/// What the after phase did with an emptied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    /// The slot still exists
    SlotKept,
    /// A filler was removed and handed back to the allocator
    FillerVacated,
    /// No capture was found for the emptied slot
    MissingCapture,
    /// An existing placeholder was released on purpose
    Released,
    /// Only locked items keep placeholders and this one was unlocked
    SkippedUnlocked,
    /// The tab does not keep placeholders
    SkippedDisabledTab,
    Restored,
    /// The captured position no longer fits the tab
    RestoreFailed,
}

pub struct RemovalInterceptor {
    metadata: MetadataStore,
    empties: Arc<EmptyAllocator>,
    settings: Arc<RwLock<PlaceholderSettings>>,
}

impl RemovalInterceptor {
    pub fn new(
        metadata: MetadataStore,
        empties: Arc<EmptyAllocator>,
        settings: Arc<RwLock<PlaceholderSettings>>,
    ) -> Self {
        Self {
            metadata,
            empties,
            settings,
        }
    }

    /// Before phase: capture the slot if this removal can empty it
    pub fn intercept_removal(&self, bank: &Bank, request: RemovalRequest) -> RemovalRequest {
        let Some(slot) = bank.slot(&request.item) else {
            return request;
        };

        let snapshot = |is_placeholder| PlaceholderMetadata {
            tab: slot.tab,
            tab_position: slot.tab_position,
            locked: bank.is_locked(&slot.item),
            is_placeholder,
        };

        if slot.quantity == 0 && request.amount == RemovalAmount::All {
            // Releasing a placeholder: "all" of nothing would be a no-op, so remove one
            self.metadata.capture(&request.item, snapshot(true));
            debug!("[Placeholders] Releasing placeholder {}", request.item);
            return RemovalRequest::new(request.item, RemovalAmount::Exactly(1));
        }

        if request.amount.resolve(slot.quantity) >= slot.quantity {
            self.metadata.capture(&request.item, snapshot(false));
        }
        request
    }

    /// After phase: restore, release or clean up the emptied slot
    pub fn finalize_removal(&self, bank: &mut Bank, item: &ItemId) -> Finalization {
        if bank.contains(item) {
            self.metadata.discard(item);
            return Finalization::SlotKept;
        }

        if self.empties.is_filler(item) {
            self.metadata.discard(item);
            self.empties.vacate(item);
            return Finalization::FillerVacated;
        }

        let Some(metadata) = self.metadata.take(item) else {
            warn!("[Placeholders] {} left the bank without captured metadata, no placeholder kept", item);
            return Finalization::MissingCapture;
        };

        if metadata.is_placeholder {
            debug!("[Placeholders] Placeholder {} released", item);
            return Finalization::Released;
        }

        {
            let settings = self.settings.read();
            if settings.only_locked && !metadata.locked {
                debug!("[Placeholders] {} was not locked, no placeholder kept", item);
                return Finalization::SkippedUnlocked;
            }
            if settings.is_tab_disabled(metadata.tab) {
                debug!("[Placeholders] Tab {} is disabled, no placeholder for {}", metadata.tab, item);
                return Finalization::SkippedDisabledTab;
            }
        }

        if restore_placeholder(bank, item, &metadata) {
            Finalization::Restored
        } else {
            Finalization::RestoreFailed
        }
    }
}

impl RemovalHook for RemovalInterceptor {
    fn before_remove(&self, bank: &Bank, request: RemovalRequest) -> RemovalRequest {
        self.intercept_removal(bank, request)
    }

    fn after_remove(&self, bank: &mut Bank, item: &ItemId) {
        self.finalize_removal(bank, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::types::TabId;
    use serde_json::json;

    struct Fixture {
        bank: Bank,
        interceptor: Arc<RemovalInterceptor>,
        character: Arc<MemoryStore>,
        settings: Arc<RwLock<PlaceholderSettings>>,
    }

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    fn fixture(items: &[(&str, u64)]) -> Fixture {
        let character = Arc::new(MemoryStore::new());
        let account = Arc::new(MemoryStore::new());
        account.set("countEmpties", json!(10)).unwrap();
        let empties = Arc::new(EmptyAllocator::new(account, Arc::new(InMemoryCatalog::new())));
        let settings = Arc::new(RwLock::new(PlaceholderSettings::default()));
        let interceptor = Arc::new(RemovalInterceptor::new(
            MetadataStore::new(character.clone()),
            empties,
            settings.clone(),
        ));

        let mut bank = Bank::new(3);
        bank.register_removal_hook(interceptor.clone());
        for (name, quantity) in items {
            bank.add_item(&id(name), *quantity, true);
        }
        bank.take_render_queue();

        Fixture {
            bank,
            interceptor,
            character,
            settings,
        }
    }

    fn layout(bank: &Bank, tab: TabId) -> Vec<(String, u64, usize)> {
        bank.tab_slots(tab)
            .into_iter()
            .map(|s| (s.item.to_string(), s.quantity, s.tab_position))
            .collect()
    }

    #[test]
    fn test_depletion_leaves_placeholder_in_place() {
        let mut f = fixture(&[("a", 1), ("b", 5), ("c", 2), ("d", 9)]);

        f.bank.remove_item_quantity(&id("b"), RemovalAmount::Exactly(5));

        assert_eq!(
            layout(&f.bank, 0),
            vec![
                ("a".to_string(), 1, 0),
                ("b".to_string(), 0, 1),
                ("c".to_string(), 2, 2),
                ("d".to_string(), 9, 3),
            ]
        );
        assert!(f.character.is_empty());
        assert!(f.bank.take_render_queue().items.contains(&id("b")));
    }

    #[test]
    fn test_over_removal_and_remove_all_also_deplete() {
        let mut f = fixture(&[("a", 3), ("b", 4)]);
        f.bank.remove_item_quantity(&id("a"), RemovalAmount::Exactly(10));
        f.bank.remove_item_quantity(&id("b"), RemovalAmount::All);

        assert_eq!(layout(&f.bank, 0), vec![("a".to_string(), 0, 0), ("b".to_string(), 0, 1)]);
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_lock_survives_depletion() {
        let mut f = fixture(&[("a", 3)]);
        f.bank.set_locked(&id("a"), true);

        f.bank.remove_item_quantity(&id("a"), RemovalAmount::All);

        assert_eq!(f.bank.quantity(&id("a")), 0);
        assert!(f.bank.is_locked(&id("a")));
    }

    #[test]
    fn test_partial_removal_captures_nothing() {
        let f = fixture(&[("a", 3)]);
        let request = f
            .interceptor
            .intercept_removal(&f.bank, RemovalRequest::new("a", RemovalAmount::Exactly(2)));

        assert_eq!(request.amount, RemovalAmount::Exactly(2));
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_before_phase_rewrites_release() {
        let mut f = fixture(&[("a", 3)]);
        f.bank.remove_item_quantity(&id("a"), RemovalAmount::All);

        let request = f
            .interceptor
            .intercept_removal(&f.bank, RemovalRequest::new("a", RemovalAmount::All));

        assert_eq!(request.amount, RemovalAmount::Exactly(1));
        let stored = f.character.get("placeholder:a").unwrap();
        assert_eq!(stored["isPlaceholder"], true);
    }

    #[test]
    fn test_release_is_terminal() {
        let mut f = fixture(&[("a", 1), ("b", 1), ("c", 1)]);
        f.bank.remove_item_quantity(&id("b"), RemovalAmount::All);
        assert_eq!(f.bank.quantity(&id("b")), 0);
        assert!(f.bank.contains(&id("b")));

        f.bank.remove_item_quantity(&id("b"), RemovalAmount::All);

        assert!(!f.bank.contains(&id("b")));
        assert_eq!(layout(&f.bank, 0), vec![("a".to_string(), 1, 0), ("c".to_string(), 1, 1)]);
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_consuming_from_placeholder_keeps_it() {
        let mut f = fixture(&[("a", 1)]);
        f.bank.remove_item_quantity(&id("a"), RemovalAmount::All);
        f.bank.remove_item_quantity(&id("a"), RemovalAmount::Exactly(4));

        assert_eq!(layout(&f.bank, 0), vec![("a".to_string(), 0, 0)]);
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_only_locked_policy() {
        let mut f = fixture(&[("locked", 2), ("loose", 2)]);
        f.settings.write().only_locked = true;
        f.bank.set_locked(&id("locked"), true);

        f.bank.remove_item_quantity(&id("locked"), RemovalAmount::All);
        f.bank.remove_item_quantity(&id("loose"), RemovalAmount::All);

        assert!(f.bank.contains(&id("locked")));
        assert!(!f.bank.contains(&id("loose")));
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_disabled_tab_policy() {
        let mut f = fixture(&[]);
        f.settings.write().disabled_tabs.insert(1);
        f.bank.add_item_to_tab(&id("x"), 1, 1, true);
        f.bank.add_item_to_tab(&id("y"), 1, 2, true);

        f.bank.remove_item_quantity(&id("x"), RemovalAmount::All);
        f.bank.remove_item_quantity(&id("y"), RemovalAmount::All);

        assert!(!f.bank.contains(&id("x")));
        assert_eq!(f.bank.quantity(&id("y")), 0);
        assert!(f.bank.contains(&id("y")));
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_fillers_never_become_placeholders() {
        let mut f = fixture(&[("a", 1)]);
        f.bank.insert_slot_record(crate::types::BankSlot {
            item: id("empty_i_2"),
            quantity: 0,
            tab: 0,
            tab_position: 1,
        });
        f.bank.tab_mut(0).unwrap().push(id("empty_i_2"));

        f.bank.remove_item_quantity(&id("empty_i_2"), RemovalAmount::All);

        assert!(!f.bank.contains(&id("empty_i_2")));
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_missing_capture_restores_nothing() {
        let mut f = fixture(&[("a", 1)]);
        // Emptied behind the interceptor's back
        let outcome = f.interceptor.finalize_removal(&mut f.bank, &id("ghost"));
        assert_eq!(outcome, Finalization::MissingCapture);
        assert!(!f.bank.contains(&id("ghost")));
    }

    #[test]
    fn test_stale_capture_is_dropped() {
        let mut f = fixture(&[("a", 1)]);
        MetadataStore::new(f.character.clone()).capture(
            &id("lost"),
            PlaceholderMetadata {
                tab: 0,
                tab_position: 5,
                locked: false,
                is_placeholder: false,
            },
        );

        let outcome = f.interceptor.finalize_removal(&mut f.bank, &id("lost"));

        assert_eq!(outcome, Finalization::RestoreFailed);
        assert!(!f.bank.contains(&id("lost")));
        assert!(f.character.is_empty());
    }

    #[test]
    fn test_removing_unknown_item_is_harmless() {
        let mut f = fixture(&[("a", 1)]);
        f.bank.remove_item_quantity(&id("nope"), RemovalAmount::All);
        assert_eq!(layout(&f.bank, 0), vec![("a".to_string(), 1, 0)]);
        assert!(f.character.is_empty());
    }
}
