pub mod metadata;
pub mod owner;
pub mod store;

pub use metadata::MetadataStore;
pub use owner::OwnerStorage;
pub use store::{get_typed, set_typed, JsonFileStore, KeyValueStore, MemoryStore, StorageError};
