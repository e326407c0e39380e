//! Shared API response types

pub mod response;

pub use response::{HealthResponse, HealthStatus, MessageResponse};
