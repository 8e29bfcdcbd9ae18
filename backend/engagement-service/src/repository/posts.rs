use super::{PostStore, UserDirectory};
use crate::domain::{NewPost, Post, UserSummary};
use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostStore for PgRecordStore {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, like_count, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load post")?;

        Ok(post)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, like_count, created_at)
            VALUES ($1, $2, $3, 0, NOW())
            RETURNING id, author_id, content, like_count, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.author_id)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert post")?;

        Ok(post)
    }

    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> Result<bool> {
        // Single-statement update keeps the increment atomic in the database
        let affected = sqlx::query(
            r#"
            UPDATE posts
            SET like_count = like_count + $2
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .execute(&self.pool)
        .await
        .context("Failed to adjust like count")?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn set_like_count(&self, post_id: Uuid, count: i64) -> Result<bool> {
        let affected = sqlx::query("UPDATE posts SET like_count = $2 WHERE id = $1")
            .bind(post_id)
            .bind(count)
            .execute(&self.pool)
            .await
            .context("Failed to set like count")?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let followers: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT follower_id
            FROM follows
            WHERE followee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followers")?;

        Ok(followers)
    }

    async fn get_posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, like_count, created_at
            FROM posts
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load posts by ids")?;

        Ok(posts)
    }

    async fn list_hot_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, like_count, created_at
            FROM posts
            ORDER BY like_count DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list hot posts")?;

        Ok(posts)
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgRecordStore {
    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, nickname, icon
            FROM users
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load user profiles")?;

        Ok(users)
    }
}
