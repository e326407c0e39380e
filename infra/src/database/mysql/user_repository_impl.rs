//! MySQL implementation of the UserDirectory trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use cn_core::domain::entities::user::User;
use cn_core::errors::{AuthError, DomainError};
use cn_core::repositories::UserDirectory;

use super::{db_error, is_unique_violation, parse_uuid, placeholders};

const USER_COLUMNS: &str = "id, name, email, password_hash, avatar_url, bio, profession, created_at";

/// MySQL implementation of UserDirectory
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &MySqlRow) -> Result<User, DomainError> {
        let column = |name: &str, e: sqlx::Error| DomainError::internal(format!("Failed to get {}: {}", name, e));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        Ok(User {
            id: parse_uuid(&id, "users.id")?,
            name: row.try_get("name").map_err(|e| column("name", e))?,
            email: row.try_get("email").map_err(|e| column("email", e))?,
            password_hash: row.try_get("password_hash").map_err(|e| column("password_hash", e))?,
            avatar_url: row.try_get("avatar_url").map_err(|e| column("avatar_url", e))?,
            bio: row.try_get("bio").map_err(|e| column("bio", e))?,
            profession: row.try_get("profession").map_err(|e| column("profession", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| column("created_at", e))?,
        })
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE email = ? LIMIT 1", USER_COLUMNS);
        sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by email", e))?
            .map(|row| Self::row_to_user(&row))
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE id = ? LIMIT 1", USER_COLUMNS);
        sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by id", e))?
            .map(|row| Self::row_to_user(&row))
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM users WHERE id IN ({})",
            USER_COLUMNS,
            placeholders(ids.len())
        );
        let mut statement = sqlx::query(&query);
        for id in ids {
            statement = statement.bind(id.to_string());
        }

        statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load users", e))?
            .iter()
            .map(Self::row_to_user)
            .collect()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, avatar_url, bio, profession, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(&user.profession)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(AuthError::UserAlreadyExists.into()),
            Err(e) => Err(db_error("Failed to create user", e)),
        }
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = ?, avatar_url = ?, bio = ?, profession = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(&user.profession)
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(AuthError::UserAlreadyExists.into()),
            Err(e) => return Err(db_error("Failed to update user", e)),
        }

        // rows_affected is zero for an unchanged row, so existence is checked separately.
        self.find_by_id(user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }
}
