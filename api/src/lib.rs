//! # Connect API
//!
//! actix-web server exposing sessions, posts, profiles and the real-time
//! event stream. The binary in `main.rs` picks a storage backend and hands
//! it to [`app::AppState`].

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::{create_app, AppState};
