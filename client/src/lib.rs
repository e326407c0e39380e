//! # Connect Client
//!
//! Client runtime for the Connect API. It holds the session (access token
//! in memory, refresh token in durable storage), retries a rejected call
//! exactly once after a silent refresh, decodes the server-sent event
//! stream and reconciles broadcast events into a local feed.

pub mod api;
pub mod error;
pub mod events;
pub mod reconcile;
pub mod store;
pub mod transport;

pub use api::{ApiClient, Likes, ProfileEdit};
pub use error::{ClientError, ClientResult};
pub use events::SseDecoder;
pub use reconcile::{reconcile, FeedComment, FeedPost, FeedState, TEMP_ID_PREFIX};
pub use store::{FileTokenStorage, MemoryTokenStorage, RefreshTokenStorage, SessionStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
