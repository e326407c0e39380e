//! Repository interfaces consumed by the core services.
//!
//! Implementations live in the infrastructure crate; the `mock` modules
//! provide in-memory doubles for unit tests.

pub mod ledger;
pub mod post;
pub mod user;

pub use ledger::RefreshLedger;
pub use post::PostRepository;
pub use user::UserDirectory;

#[cfg(test)]
pub use ledger::MockRefreshLedger;
#[cfg(test)]
pub use post::MockPostRepository;
#[cfg(test)]
pub use user::MockUserDirectory;
