//! Profile lookups and self-service edits

mod service;

pub use service::{ProfileChanges, ProfileService};
