/// Tabbed item bank
///
/// Slots are kept in a map keyed by item, and each tab keeps the ordered list
/// of its items. A slot's `tab_position` always matches its index in that list.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::hooks::RemovalHook;
use crate::types::{BankSlot, ItemId, RemovalAmount, RemovalRequest, TabId};

/// Items whose icons or quantities need redrawing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderQueue {
    pub items: BTreeSet<ItemId>,
    pub quantities: BTreeSet<ItemId>,
    pub space: bool,
}

impl RenderQueue {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.quantities.is_empty() && !self.space
    }
}

pub struct Bank {
    items: HashMap<ItemId, BankSlot>,
    items_by_tab: Vec<Vec<ItemId>>,
    locked: HashSet<ItemId>,
    found: HashSet<ItemId>,
    default_tabs: HashMap<ItemId, TabId>,
    render_queue: RenderQueue,
    hooks: Vec<Arc<dyn RemovalHook>>,
}

impl Bank {
    pub fn new(tab_count: usize) -> Self {
        Self {
            items: HashMap::new(),
            items_by_tab: vec![Vec::new(); tab_count.max(1)],
            locked: HashSet::new(),
            found: HashSet::new(),
            default_tabs: HashMap::new(),
            render_queue: RenderQueue::default(),
            hooks: Vec::new(),
        }
    }

    /// Register a pre/post removal extension
    pub fn register_removal_hook(&mut self, hook: Arc<dyn RemovalHook>) {
        self.hooks.push(hook);
    }

    pub fn tab_count(&self) -> usize {
        self.items_by_tab.len()
    }

    pub fn set_default_tab(&mut self, item: ItemId, tab: TabId) {
        self.default_tabs.insert(item, tab);
    }

    pub fn default_tab(&self, item: &ItemId) -> TabId {
        self.default_tabs
            .get(item)
            .copied()
            .filter(|tab| *tab < self.tab_count())
            .unwrap_or(0)
    }

    pub fn slot(&self, item: &ItemId) -> Option<&BankSlot> {
        self.items.get(item)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.contains_key(item)
    }

    pub fn quantity(&self, item: &ItemId) -> u64 {
        self.items.get(item).map(|s| s.quantity).unwrap_or(0)
    }

    pub fn slots(&self) -> impl Iterator<Item = &BankSlot> {
        self.items.values()
    }

    /// Raw number of occupied slots, placeholders included
    pub fn occupied_slots(&self) -> usize {
        self.items.len()
    }

    pub fn tab_items(&self, tab: TabId) -> Option<&[ItemId]> {
        self.items_by_tab.get(tab).map(Vec::as_slice)
    }

    /// Slots of a tab in display order
    pub fn tab_slots(&self, tab: TabId) -> Vec<&BankSlot> {
        self.tab_items(tab)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    pub fn tab_mut(&mut self, tab: TabId) -> Option<&mut Vec<ItemId>> {
        self.items_by_tab.get_mut(tab)
    }

    /// Store a slot record without touching tab ordering
    pub fn insert_slot_record(&mut self, slot: BankSlot) {
        self.items.insert(slot.item.clone(), slot);
    }

    pub fn is_locked(&self, item: &ItemId) -> bool {
        self.locked.contains(item)
    }

    pub fn set_locked(&mut self, item: &ItemId, locked: bool) {
        let changed = if locked {
            self.locked.insert(item.clone())
        } else {
            self.locked.remove(item)
        };
        if changed {
            self.render_queue.items.insert(item.clone());
        }
    }

    /// Flip the lock of an item in the bank; returns the new state
    pub fn toggle_lock(&mut self, item: &ItemId) -> Option<bool> {
        if !self.contains(item) {
            return None;
        }
        let locked = !self.is_locked(item);
        self.set_locked(item, locked);
        Some(locked)
    }

    pub fn has_found(&self, item: &ItemId) -> bool {
        self.found.contains(item)
    }

    pub fn render_queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.render_queue
    }

    pub fn take_render_queue(&mut self) -> RenderQueue {
        std::mem::take(&mut self.render_queue)
    }

    /// Add `quantity` of an item into its default tab.
    ///
    /// An item that already has a slot, placeholder or not, is topped up in
    /// place.
    pub fn add_item(&mut self, item: &ItemId, quantity: u64, found: bool) -> bool {
        let tab = self.default_tab(item);
        self.add_item_to_tab(item, quantity, tab, found)
    }

    pub fn add_item_to_tab(&mut self, item: &ItemId, quantity: u64, tab: TabId, found: bool) -> bool {
        if quantity == 0 {
            return false;
        }
        if found {
            self.found.insert(item.clone());
        }

        if let Some(slot) = self.items.get_mut(item) {
            slot.quantity = slot.quantity.saturating_add(quantity);
            self.render_queue.quantities.insert(item.clone());
            return true;
        }

        let Some(tab_items) = self.items_by_tab.get_mut(tab) else {
            warn!("[Bank] Cannot add {} to missing tab {}", item, tab);
            return false;
        };
        let slot = BankSlot {
            item: item.clone(),
            quantity,
            tab,
            tab_position: tab_items.len(),
        };
        tab_items.push(item.clone());
        self.items.insert(item.clone(), slot);
        self.render_queue.items.insert(item.clone());
        self.render_queue.space = true;
        true
    }

    /// Remove quantity of an item, running every registered removal hook.
    pub fn remove_item_quantity(&mut self, item: &ItemId, amount: RemovalAmount) {
        let hooks = self.hooks.clone();
        let mut request = RemovalRequest::new(item.clone(), amount);
        for hook in &hooks {
            request = hook.before_remove(self, request);
        }

        self.apply_removal(&request);

        for hook in &hooks {
            hook.after_remove(self, &request.item);
        }
    }

    fn apply_removal(&mut self, request: &RemovalRequest) {
        let Some(slot) = self.items.get_mut(&request.item) else {
            debug!("[Bank] Nothing to remove for {}", request.item);
            return;
        };

        let amount = request.amount.resolve(slot.quantity);
        if amount == 0 {
            return;
        }

        if amount < slot.quantity {
            slot.quantity -= amount;
            self.render_queue.quantities.insert(request.item.clone());
            return;
        }

        if let Some(slot) = self.items.remove(&request.item) {
            self.locked.remove(&request.item);
            self.remove_from_tab(&slot);
            self.render_queue.items.insert(request.item.clone());
            self.render_queue.space = true;
            debug!("[Bank] {} removed from tab {} position {}", slot.item, slot.tab, slot.tab_position);
        }
    }

    fn remove_from_tab(&mut self, slot: &BankSlot) {
        let Some(tab_items) = self.items_by_tab.get_mut(slot.tab) else {
            return;
        };
        let position = if tab_items.get(slot.tab_position) == Some(&slot.item) {
            Some(slot.tab_position)
        } else {
            tab_items.iter().position(|id| id == &slot.item)
        };
        if let Some(position) = position {
            tab_items.remove(position);
            self.reassign_positions(slot.tab, position);
        }
    }

    /// Rewrite `tab_position` of every slot in `tab` from `start` onwards
    pub fn reassign_positions(&mut self, tab: TabId, start: usize) {
        let Some(tab_items) = self.items_by_tab.get(tab) else {
            return;
        };
        for (position, id) in tab_items.iter().enumerate().skip(start) {
            if let Some(slot) = self.items.get_mut(id) {
                slot.tab_position = position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    fn positions(bank: &Bank, tab: TabId) -> Vec<(String, usize)> {
        bank.tab_slots(tab)
            .into_iter()
            .map(|s| (s.item.to_string(), s.tab_position))
            .collect()
    }

    #[test]
    fn test_add_item_appends_and_tops_up() {
        let mut bank = Bank::new(2);
        bank.set_default_tab(id("ore"), 1);

        assert!(bank.add_item(&id("logs"), 5, true));
        assert!(bank.add_item(&id("ore"), 2, false));
        assert!(bank.add_item(&id("logs"), 3, true));
        assert!(!bank.add_item(&id("logs"), 0, true));

        assert_eq!(bank.quantity(&id("logs")), 8);
        assert_eq!(bank.slot(&id("ore")).unwrap().tab, 1);
        assert!(bank.has_found(&id("logs")));
        assert!(!bank.has_found(&id("ore")));
        assert_eq!(bank.occupied_slots(), 2);
    }

    #[test]
    fn test_partial_and_full_removal() {
        let mut bank = Bank::new(1);
        for name in ["a", "b", "c"] {
            bank.add_item(&id(name), 10, true);
        }
        bank.set_locked(&id("b"), true);

        bank.remove_item_quantity(&id("b"), RemovalAmount::Exactly(4));
        assert_eq!(bank.quantity(&id("b")), 6);

        bank.remove_item_quantity(&id("b"), RemovalAmount::All);
        assert!(!bank.contains(&id("b")));
        assert!(!bank.is_locked(&id("b")));
        assert_eq!(positions(&bank, 0), vec![("a".to_string(), 0), ("c".to_string(), 1)]);
    }

    #[test]
    fn test_remove_all_on_zero_quantity_slot_is_noop() {
        let mut bank = Bank::new(1);
        bank.add_item(&id("a"), 1, true);
        bank.insert_slot_record(BankSlot {
            item: id("ghost"),
            quantity: 0,
            tab: 0,
            tab_position: 1,
        });
        bank.tab_mut(0).unwrap().push(id("ghost"));

        bank.remove_item_quantity(&id("ghost"), RemovalAmount::All);
        assert!(bank.contains(&id("ghost")));

        bank.remove_item_quantity(&id("ghost"), RemovalAmount::Exactly(1));
        assert!(!bank.contains(&id("ghost")));
    }

    #[test]
    fn test_toggle_lock() {
        let mut bank = Bank::new(1);
        assert_eq!(bank.toggle_lock(&id("a")), None);
        bank.add_item(&id("a"), 1, true);
        assert_eq!(bank.toggle_lock(&id("a")), Some(true));
        assert_eq!(bank.toggle_lock(&id("a")), Some(false));
    }

    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl RemovalHook for Recorder {
        fn before_remove(&self, bank: &Bank, request: RemovalRequest) -> RemovalRequest {
            self.calls.lock().push(format!("before:{}", bank.quantity(&request.item)));
            RemovalRequest::new(request.item, RemovalAmount::Exactly(1))
        }

        fn after_remove(&self, bank: &mut Bank, item: &ItemId) {
            self.calls.lock().push(format!("after:{}", bank.quantity(item)));
        }
    }

    #[test]
    fn test_hooks_wrap_removal_and_may_rewrite() {
        let recorder = Arc::new(Recorder {
            calls: Mutex::new(Vec::new()),
        });
        let mut bank = Bank::new(1);
        bank.register_removal_hook(recorder.clone());
        bank.add_item(&id("a"), 5, true);

        bank.remove_item_quantity(&id("a"), RemovalAmount::All);

        assert_eq!(bank.quantity(&id("a")), 4);
        assert_eq!(*recorder.calls.lock(), vec!["before:5", "after:4"]);
    }

    #[test]
    fn test_render_queue_tracks_changes() {
        let mut bank = Bank::new(1);
        bank.add_item(&id("a"), 5, true);
        let queue = bank.take_render_queue();
        assert!(queue.items.contains(&id("a")));
        assert!(queue.space);
        assert!(bank.take_render_queue().is_empty());

        bank.remove_item_quantity(&id("a"), RemovalAmount::Exactly(1));
        assert!(bank.take_render_queue().quantities.contains(&id("a")));
    }
}
