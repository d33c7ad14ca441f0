//! Bank placeholders
//!
//! Keeps emptied bank slots as zero-quantity placeholders so re-acquired items
//! return to the exact tab and position they left, and manages synthetic
//! "empty" filler items that hold a slot without representing a real item.

pub mod bank;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod notifications;
pub mod placeholders;
pub mod storage;
pub mod types;
pub mod utils;

pub use bank::{Bank, RemovalHook};
pub use config::{CompletionLogPolicy, Config, PlaceholderSettings};
pub use placeholders::{EmptyAllocator, Placeholders, RemovalInterceptor};
pub use types::{BankSlot, ItemId, PlaceholderMetadata, RemovalAmount, RemovalRequest, TabId};
