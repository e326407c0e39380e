//! Request and response bodies

pub mod auth;
pub mod post;
pub mod user;

pub use auth::{LoginRequest, LogoutRequest, RefreshTokenRequest, SignupRequest};
pub use post::{CommentRequest, CreatePostRequest, LikeResponse, MediaDto, UpdatePostRequest};
pub use user::UpdateProfileRequest;
