//! Profile service implementation

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::entities::user::{ProfileUpdate, User, MIN_PASSWORD_LENGTH};
use crate::domain::password;
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::UserDirectory;

/// Requested changes to the caller's own profile
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profession: Option<String>,
    pub avatar_url: Option<String>,
    /// Required when `new_password` is set
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Profile use cases
pub struct ProfileService<U: UserDirectory> {
    users: Arc<U>,
    bcrypt_cost: u32,
}

impl<U: UserDirectory> ProfileService<U> {
    pub fn new(users: Arc<U>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Load a profile by id
    pub async fn get(&self, user_id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    /// Apply `changes` to the profile of `user_id`
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The updated profile
    /// * `Err(DomainError::Validation)` - Empty name, password change without
    ///   a correct current password, or a too short new password
    /// * `Err(AuthError::UserAlreadyExists)` - New email belongs to another account
    pub async fn update(&self, user_id: Uuid, changes: ProfileChanges) -> DomainResult<User> {
        let mut user = self.get(user_id).await?;

        let name = match changes.name.map(|n| n.trim().to_string()) {
            Some(name) if name.is_empty() => return Err(DomainError::validation("Name cannot be empty")),
            other => other,
        };

        let email = changes.email.map(|e| e.trim().to_string()).filter(|e| *e != user.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(DomainError::validation("A valid email is required"));
            }
            if self.users.find_by_email(email).await?.is_some() {
                return Err(AuthError::UserAlreadyExists.into());
            }
        }

        let password_hash = match changes.new_password {
            Some(new_password) => {
                let current = changes.current_password.ok_or_else(|| {
                    DomainError::validation("Current password is required to set new password")
                })?;
                if !self.users.verify_password(&user, &current).await {
                    return Err(DomainError::validation("Current password is incorrect"));
                }
                if new_password.len() < MIN_PASSWORD_LENGTH {
                    return Err(DomainError::validation(format!(
                        "New password must be at least {} characters long",
                        MIN_PASSWORD_LENGTH
                    )));
                }
                Some(password::hash_blocking(new_password, self.bcrypt_cost).await?)
            }
            None => None,
        };

        ProfileUpdate {
            name,
            email,
            bio: changes.bio,
            profession: changes.profession,
            avatar_url: changes.avatar_url,
            password_hash,
        }
        .apply_to(&mut user);

        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}
