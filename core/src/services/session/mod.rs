//! Session module
//!
//! This module provides the session lifecycle:
//! - Login and signup issuing an access/refresh pair
//! - Refresh with single-use rotation against the ledger
//! - Logout, which never fails visibly, and logout everywhere

mod config;
mod service;
mod state;


pub use config::SessionConfig;
pub use service::{IssuedSession, SessionManager, SignupRequest};
pub use state::SessionState;
