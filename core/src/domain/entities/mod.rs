//! Domain entities representing core business objects.

pub mod post;
pub mod token;
pub mod user;


// Re-export commonly used types
pub use post::{
    CommentRecord, CommentView, MediaRef, NewPost, PostRecord, PostView, MAX_MEDIA_PER_POST,
};
pub use token::{
    AccessClaims, AccessToken, LedgerEntry, RefreshClaims, RefreshToken, TokenClaims, TokenId,
    TokenKind, TokenPair,
};
pub use user::{AuthorSummary, NewUser, ProfileUpdate, User, UserSummary, MIN_PASSWORD_LENGTH};
