//! User directory trait: the account lookups the session and post services need.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::domain::password;
use crate::errors::DomainError;

/// Repository trait for user accounts
///
/// Sessions depend only on `find_by_email`, `find_by_id` and
/// `verify_password`; signup, profile edits and author hydration use the rest.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by login email
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No account with this email
    /// * `Err(DomainError)` - Storage failure
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Fetch several users at once; missing ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError>;

    /// Store a new account
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - Email taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Persist changes to an existing account
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::NotFound)` - No such account
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - New email taken
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Check a plaintext password against the stored hash, off the async executor
    async fn verify_password(&self, user: &User, plaintext: &str) -> bool {
        password::verify_blocking(plaintext, &user.password_hash).await
    }
}
