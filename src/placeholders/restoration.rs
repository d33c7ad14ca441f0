use tracing::debug;

use crate::bank::Bank;
use crate::types::{BankSlot, ItemId, PlaceholderMetadata, TabId};

/// Put a placeholder back where the captured metadata says it was
pub fn restore_placeholder(bank: &mut Bank, item: &ItemId, metadata: &PlaceholderMetadata) -> bool {
    insert_placeholder(bank, item, metadata.tab, metadata.tab_position, metadata.locked)
}

/// Splice a zero-quantity slot into `tab` at `position`.
///
/// Later slots shift one place to the right and get their positions
/// rewritten. A missing tab, an out of range position or an item that
/// already has a slot leaves the bank untouched.
pub fn insert_placeholder(
    bank: &mut Bank,
    item: &ItemId,
    tab: TabId,
    position: usize,
    locked: bool,
) -> bool {
    if bank.contains(item) {
        debug!("[Placeholders] {} already has a slot, not restoring", item);
        return false;
    }

    let Some(tab_items) = bank.tab_mut(tab) else {
        debug!("[Placeholders] Tab {} no longer exists, dropping placeholder for {}", tab, item);
        return false;
    };
    if position > tab_items.len() {
        debug!(
            "[Placeholders] Position {} is past the end of tab {} ({} slots), dropping placeholder for {}",
            position,
            tab,
            tab_items.len(),
            item
        );
        return false;
    }

    tab_items.insert(position, item.clone());
    bank.insert_slot_record(BankSlot {
        item: item.clone(),
        quantity: 0,
        tab,
        tab_position: position,
    });
    bank.reassign_positions(tab, position);
    if locked {
        bank.set_locked(item, true);
    }

    let queue = bank.render_queue_mut();
    queue.items.insert(item.clone());
    queue.quantities.insert(item.clone());
    queue.space = true;

    debug!("[Placeholders] Restored {} at tab {} position {}", item, tab, position);
    true
}

/// Add a placeholder at the end of `tab`
pub fn append_placeholder(bank: &mut Bank, item: &ItemId, tab: TabId, locked: bool) -> bool {
    let Some(end) = bank.tab_items(tab).map(<[ItemId]>::len) else {
        debug!("[Placeholders] Tab {} does not exist", tab);
        return false;
    };
    insert_placeholder(bank, item, tab, end, locked)
}
