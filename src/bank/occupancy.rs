use crate::types::{BankSlot, ItemId};

/// Occupied slot count after discounting slots that should not use up space.
///
/// With `use_slots` only fillers are free, so real placeholders still count.
/// Without it every zero-quantity slot is free.
pub fn effective_occupied<'a, I, F>(raw_occupied: usize, slots: I, use_slots: bool, is_filler: F) -> usize
where
    I: IntoIterator<Item = &'a BankSlot>,
    F: Fn(&ItemId) -> bool,
{
    let free = slots
        .into_iter()
        .filter(|slot| {
            if use_slots {
                is_filler(&slot.item)
            } else {
                slot.quantity == 0
            }
        })
        .count();

    raw_occupied.saturating_sub(free)
}
