use crate::errors::{AuthError, DomainError, TokenError};

#[test]
fn test_transparent_display() {
    let err: DomainError = TokenError::Revoked.into();
    assert_eq!(err.to_string(), "Token revoked");

    let err: DomainError = AuthError::InvalidCredentials.into();
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[test]
fn test_refresh_failure_classification() {
    assert!(DomainError::from(TokenError::Expired).is_refresh_failure());
    assert!(DomainError::from(TokenError::Malformed).is_refresh_failure());
    assert!(DomainError::from(AuthError::InvalidSubject).is_refresh_failure());
    assert!(!DomainError::from(AuthError::InvalidCredentials).is_refresh_failure());
    assert!(!DomainError::not_found("post").is_refresh_failure());
}
