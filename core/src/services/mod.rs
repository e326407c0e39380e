//! Business services containing domain logic and use cases.

pub mod broadcast;
pub mod posts;
pub mod profile;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use broadcast::{EventHub, PublishReport, SubscriberId, Subscription};
pub use posts::PostService;
pub use profile::{ProfileChanges, ProfileService};
pub use session::{IssuedSession, SessionConfig, SessionManager, SessionState, SignupRequest};
pub use token::{LedgerReaper, LedgerReaperConfig, ReapResult, TokenCodec, TokenCodecConfig};
