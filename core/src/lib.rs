//! # Connect Core
//!
//! Core business logic and domain layer for the Connect backend.
//! This crate contains domain entities, broadcast events, the token and
//! session services, the event hub, repository interfaces, and the error
//! types that form the foundation of the application architecture.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
