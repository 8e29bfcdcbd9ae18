use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - the authoritative like count lives here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Timeline score for this post (publish time in epoch milliseconds)
    pub fn publish_score(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// A post about to be persisted; id and timestamp are assigned by the store
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: String,
}

/// Publish payload accepted from callers
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub content: String,
}

/// Follow edge (follower -> followee)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
}

/// Public profile fields used for hydration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub nickname: String,
    pub icon: Option<String>,
}

/// Post hydrated for a specific viewer
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author_nickname: Option<String>,
    pub author_icon: Option<String>,
    pub is_liked: bool,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub post_id: Uuid,
    pub liked: bool,
}

/// One page of the personal feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    /// Pass back as `max_score` for the next page
    pub min_time: i64,
    /// Pass back as `offset` for the next page
    pub offset: usize,
    pub exhausted: bool,
}
