//! In-memory repository implementations
//!
//! Used when `database.backend = "memory"` and by integration tests. State is
//! lost on restart. Each store is cheap to clone; clones share state.

mod ledger;
mod posts;
mod users;

pub use ledger::InMemoryRefreshLedger;
pub use posts::InMemoryPostRepository;
pub use users::InMemoryUserDirectory;
