pub mod container;
pub mod hooks;
pub mod occupancy;

pub use container::{Bank, RenderQueue};
pub use hooks::RemovalHook;
pub use occupancy::effective_occupied;
