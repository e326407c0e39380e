//! MySQL implementation of the PostRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use cn_core::domain::entities::post::{CommentRecord, MediaRef, PostRecord};
use cn_core::errors::DomainError;
use cn_core::repositories::PostRepository;

use super::{db_error, parse_uuid, placeholders};

/// MySQL implementation of PostRepository
///
/// Posts, likes and comments live in separate tables; a record is assembled
/// from one query per table. Deleting a post cascades to its likes and
/// comments.
pub struct MySqlPostRepository {
    pool: MySqlPool,
}

impl MySqlPostRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_post(row: &MySqlRow) -> Result<PostRecord, DomainError> {
        let column = |name: &str, e: sqlx::Error| DomainError::internal(format!("Failed to get {}: {}", name, e));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let author_id: String = row.try_get("author_id").map_err(|e| column("author_id", e))?;
        let media_json: String = row.try_get("media_json").map_err(|e| column("media_json", e))?;
        let media: Vec<MediaRef> = serde_json::from_str(&media_json)
            .map_err(|e| DomainError::internal(format!("Invalid media for post {}: {}", id, e)))?;

        Ok(PostRecord {
            id: parse_uuid(&id, "posts.id")?,
            author_id: parse_uuid(&author_id, "posts.author_id")?,
            text: row.try_get("text").map_err(|e| column("text", e))?,
            media,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| column("created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| column("updated_at", e))?,
        })
    }

    fn row_to_comment(row: &MySqlRow) -> Result<(Uuid, CommentRecord), DomainError> {
        let column = |name: &str, e: sqlx::Error| DomainError::internal(format!("Failed to get {}: {}", name, e));

        let post_id: String = row.try_get("post_id").map_err(|e| column("post_id", e))?;
        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let author_id: String = row.try_get("author_id").map_err(|e| column("author_id", e))?;

        Ok((
            parse_uuid(&post_id, "post_comments.post_id")?,
            CommentRecord {
                id: parse_uuid(&id, "post_comments.id")?,
                author_id: parse_uuid(&author_id, "post_comments.author_id")?,
                text: row.try_get("text").map_err(|e| column("text", e))?,
                created_at: row
                    .try_get::<DateTime<Utc>, _>("created_at")
                    .map_err(|e| column("created_at", e))?,
            },
        ))
    }

    /// Fill in likes and comments for already loaded posts
    async fn attach_children(&self, posts: &mut [PostRecord]) -> Result<(), DomainError> {
        if posts.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = posts.iter().map(|p| p.id.to_string()).collect();
        let marks = placeholders(ids.len());

        let likes_query = format!(
            "SELECT post_id, user_id FROM post_likes WHERE post_id IN ({}) ORDER BY created_at ASC",
            marks
        );
        let mut likes_statement = sqlx::query(&likes_query);
        for id in &ids {
            likes_statement = likes_statement.bind(id);
        }
        let like_rows = likes_statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load likes", e))?;

        let comments_query = format!(
            "SELECT id, post_id, author_id, text, created_at FROM post_comments \
             WHERE post_id IN ({}) ORDER BY created_at ASC",
            marks
        );
        let mut comments_statement = sqlx::query(&comments_query);
        for id in &ids {
            comments_statement = comments_statement.bind(id);
        }
        let comment_rows = comments_statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load comments", e))?;

        let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(posts.len());
        for (i, post) in posts.iter().enumerate() {
            index.insert(post.id, i);
        }

        for row in &like_rows {
            let post_id: String = row
                .try_get("post_id")
                .map_err(|e| DomainError::internal(format!("Failed to get post_id: {}", e)))?;
            let user_id: String = row
                .try_get("user_id")
                .map_err(|e| DomainError::internal(format!("Failed to get user_id: {}", e)))?;
            let post_id = parse_uuid(&post_id, "post_likes.post_id")?;
            if let Some(&i) = index.get(&post_id) {
                posts[i].likes.push(parse_uuid(&user_id, "post_likes.user_id")?);
            }
        }

        for row in &comment_rows {
            let (post_id, comment) = Self::row_to_comment(row)?;
            if let Some(&i) = index.get(&post_id) {
                posts[i].comments.push(comment);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for MySqlPostRepository {
    async fn create(&self, post: PostRecord) -> Result<PostRecord, DomainError> {
        let media_json = serde_json::to_string(&post.media)
            .map_err(|e| DomainError::internal(format!("Failed to encode media: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, text, media_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(post.author_id.to_string())
        .bind(&post.text)
        .bind(media_json)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create post", e))?;

        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, DomainError> {
        let row = sqlx::query(
            "SELECT id, author_id, text, media_json, created_at, updated_at FROM posts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find post", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut posts = vec![Self::row_to_post(&row)?];
        self.attach_children(&mut posts).await?;
        Ok(posts.pop())
    }

    async fn list_recent(&self) -> Result<Vec<PostRecord>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, author_id, text, media_json, created_at, updated_at FROM posts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list posts", e))?;

        let mut posts = rows
            .iter()
            .map(Self::row_to_post)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_children(&mut posts).await?;
        Ok(posts)
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<PostRecord>, DomainError> {
        let result = sqlx::query("UPDATE posts SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update post", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete post", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin like toggle", e))?;

        // Row lock on the post serializes toggles for the same post.
        let exists = sqlx::query("SELECT id FROM posts WHERE id = ? FOR UPDATE")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock post", e))?;

        if exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| db_error("Failed to roll back like toggle", e))?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to remove like", e))?;

        if removed.rows_affected() == 0 {
            sqlx::query("INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(id.to_string())
                .bind(user_id.to_string())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to add like", e))?;
        }

        let rows = sqlx::query("SELECT user_id FROM post_likes WHERE post_id = ? ORDER BY created_at ASC")
            .bind(id.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to reload likes", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit like toggle", e))?;

        rows.iter()
            .map(|row| {
                let user_id: String = row
                    .try_get("user_id")
                    .map_err(|e| DomainError::internal(format!("Failed to get user_id: {}", e)))?;
                parse_uuid(&user_id, "post_likes.user_id")
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    async fn add_comment(&self, post_id: Uuid, comment: CommentRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, author_id, text, created_at)
            SELECT ?, id, ?, ?, ? FROM posts WHERE id = ?
            "#,
        )
        .bind(comment.id.to_string())
        .bind(comment.author_id.to_string())
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(post_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to add comment", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM post_comments WHERE id = ? AND post_id = ?")
            .bind(comment_id.to_string())
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to remove comment", e))?;
        Ok(result.rows_affected() > 0)
    }
}
