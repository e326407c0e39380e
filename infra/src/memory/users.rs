use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cn_core::domain::entities::user::User;
use cn_core::errors::{AuthError, DomainError};
use cn_core::repositories::UserDirectory;

#[derive(Default)]
struct Directory {
    by_id: HashMap<Uuid, User>,
    /// email -> id; mirrors the unique index of the SQL schema
    by_email: HashMap<String, Uuid>,
}

/// User accounts kept in memory, with a unique email index
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    inner: Arc<RwLock<Directory>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete an account; returns whether it existed
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut dir = self.inner.write().await;
        match dir.by_id.remove(&id) {
            Some(user) => {
                dir.by_email.remove(&user.email);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let dir = self.inner.read().await;
        Ok(dir
            .by_email
            .get(email)
            .and_then(|id| dir.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        let dir = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| dir.by_id.get(id).cloned()).collect())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut dir = self.inner.write().await;
        if dir.by_email.contains_key(&user.email) {
            return Err(AuthError::UserAlreadyExists.into());
        }
        dir.by_email.insert(user.email.clone(), user.id);
        dir.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut dir = self.inner.write().await;

        let previous_email = match dir.by_id.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(DomainError::not_found("user")),
        };

        if previous_email != user.email {
            if dir.by_email.contains_key(&user.email) {
                return Err(AuthError::UserAlreadyExists.into());
            }
            dir.by_email.remove(&previous_email);
            dir.by_email.insert(user.email.clone(), user.id);
        }

        dir.by_id.insert(user.id, user.clone());
        Ok(user)
    }
}
