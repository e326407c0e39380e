//! Domain layer containing business entities and broadcast events.

pub mod entities;
pub mod events;
pub mod password;

// Re-export commonly used domain types
pub use entities::*;
pub use events::*;
