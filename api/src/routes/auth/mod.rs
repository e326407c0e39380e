//! Authentication route handlers
//!
//! - Login and signup, both returning a fresh session
//! - Token refresh with rotation
//! - Logout of one session or of every session

pub mod login;
pub mod logout;
pub mod refresh;
pub mod signup;

pub use login::login;
pub use logout::{logout, logout_all};
pub use refresh::refresh;
pub use signup::signup;
