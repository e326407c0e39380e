//! Mock implementation of UserDirectory for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user::{NewUser, User};
use crate::domain::password;
use crate::errors::{AuthError, DomainError};

use super::r#trait::UserDirectory;

/// Mock user directory for testing
#[derive(Clone, Default)]
pub struct MockUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MockUserDirectory {
    /// Create a new mock directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with a low-cost bcrypt hash of `plaintext`
    pub async fn seed(&self, name: &str, email: &str, plaintext: &str) -> User {
        let user = User::new(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password::hash(plaintext, 4).expect("hash"),
        });
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    /// Remove a user, simulating account deletion
    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.remove(&id);
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::UserAlreadyExists.into());
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(DomainError::not_found("user"));
        }
        if users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(AuthError::UserAlreadyExists.into());
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
