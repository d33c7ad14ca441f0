//! Placeholder preservation and filler items.
//!
//! [`RemovalInterceptor`] hooks into bank removals and keeps emptied slots as
//! placeholders, [`EmptyAllocator`] manages the filler id namespace and
//! [`Placeholders`] ties both to a shared bank.

pub mod empties;
pub mod interceptor;
pub mod manager;
pub mod restoration;

pub use empties::{AllocatorError, EmptyAllocator, GROWTH_BATCH, MAX_FILLER_COUNT};
pub use interceptor::{Finalization, RemovalInterceptor};
pub use manager::{PlaceholderError, Placeholders, SharedBank};
pub use restoration::{append_placeholder, insert_placeholder, restore_placeholder};
