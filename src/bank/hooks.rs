use crate::bank::Bank;
use crate::types::{ItemId, RemovalRequest};

/// Extension point around [`Bank::remove_item_quantity`].
///
/// `before_remove` sees the bank before anything changes and may rewrite the
/// request. `after_remove` runs once the (possibly rewritten) removal has been
/// applied and may mutate the bank.
pub trait RemovalHook: Send + Sync {
    fn before_remove(&self, _bank: &Bank, request: RemovalRequest) -> RemovalRequest {
        request
    }

    fn after_remove(&self, _bank: &mut Bank, _item: &ItemId) {}
}
