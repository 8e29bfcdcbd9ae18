//! Durable record store: posts, follow edges and user profiles.
//!
//! The relational store is authoritative for posts and like counts. Both
//! traits are implemented by [`PgRecordStore`] and, for tests and local runs,
//! by [`InMemoryRecordStore`].

pub mod memory;
pub mod posts;

pub use memory::InMemoryRecordStore;
pub use posts::PgRecordStore;

use crate::domain::{NewPost, Post, UserSummary};
use anyhow::Result;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Persist a new post; the store assigns id and creation time
    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    /// Atomically add `delta` to the like counter.
    /// Returns false if the post does not exist.
    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> Result<bool>;

    /// Overwrite the like counter. Returns false if the post does not exist.
    async fn set_like_count(&self, post_id: Uuid, count: i64) -> Result<bool>;

    /// Everyone following `user_id`
    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Posts in the order of `ids`; unknown ids are skipped
    async fn get_posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>>;

    /// Posts ordered by like count (desc), newest first on ties
    async fn list_hot_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;
}

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Profiles in the order of `ids`; unknown ids are skipped
    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>>;
}
