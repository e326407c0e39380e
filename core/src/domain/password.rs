//! Password hashing helpers over bcrypt.
//!
//! bcrypt is CPU bound; async callers go through [`hash_blocking`] and
//! [`verify_blocking`], which run on tokio's blocking pool.

use crate::errors::{DomainError, DomainResult};

/// Plaintext hashed to time logins for unknown emails
const DUMMY_PLAINTEXT: &str = "connect-dummy-password";

/// Hash `plaintext` with the given bcrypt cost
pub fn hash(plaintext: &str, cost: u32) -> DomainResult<String> {
    bcrypt::hash(plaintext, cost).map_err(|e| DomainError::internal(format!("password hashing failed: {}", e)))
}

/// Check `plaintext` against a stored hash; an unparsable hash never matches
pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

/// [`hash`] on the blocking pool
pub async fn hash_blocking(plaintext: String, cost: u32) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || hash(&plaintext, cost))
        .await
        .map_err(|e| DomainError::internal(format!("password hashing task failed: {}", e)))?
}

/// [`verify`] on the blocking pool; a failed task never matches
pub async fn verify_blocking(plaintext: &str, hash: &str) -> bool {
    let (plaintext, hash) = (plaintext.to_string(), hash.to_string());
    match tokio::task::spawn_blocking(move || verify(&plaintext, &hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

/// A hash of a fixed throwaway password at `cost`
pub async fn dummy_hash(cost: u32) -> DomainResult<String> {
    hash_blocking(DUMMY_PLAINTEXT.to_string(), cost).await
}
