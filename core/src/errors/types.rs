//! Error types for authentication and token handling

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired access token
    #[error("Authentication required")]
    Unauthenticated,

    /// A verified refresh token names an account that no longer exists
    #[error("Token subject no longer exists")]
    InvalidSubject,

    #[error("Email already exists")]
    UserAlreadyExists,
}

/// Token verification and issuance errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Malformed token")]
    Malformed,

    /// The refresh token verified but its ledger row is gone (already rotated or revoked)
    #[error("Token revoked")]
    Revoked,

    #[error("Token generation failed")]
    GenerationFailed,
}
