use super::{PostStore, UserDirectory};
use crate::domain::{FollowEdge, NewPost, Post, UserSummary};
use anyhow::{bail, Result};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Process-local record store.
///
/// Inserts and counter updates can be switched to fail so callers can
/// exercise their `WriteFailed` paths.
#[derive(Default)]
pub struct InMemoryRecordStore {
    posts: DashMap<Uuid, Post>,
    // followee -> followers, in follow order
    followers: DashMap<Uuid, Vec<Uuid>>,
    users: DashMap<Uuid, UserSummary>,
    reject_inserts: AtomicBool,
    reject_counter_updates: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserSummary) {
        self.users.insert(user.id, user);
    }

    pub fn add_follow(&self, edge: FollowEdge) {
        let mut followers = self.followers.entry(edge.followee_id).or_default();
        if !followers.contains(&edge.follower_id) {
            followers.push(edge.follower_id);
        }
    }

    /// Store a post as-is, bypassing id and timestamp assignment
    pub fn seed_post(&self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn remove_post(&self, id: Uuid) -> Option<Post> {
        self.posts.remove(&id).map(|(_, post)| post)
    }

    pub fn like_count(&self, id: Uuid) -> Option<i64> {
        self.posts.get(&id).map(|post| post.like_count)
    }

    pub fn reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    pub fn reject_counter_updates(&self, reject: bool) {
        self.reject_counter_updates.store(reject, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PostStore for InMemoryRecordStore {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|post| post.value().clone()))
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            bail!("insert rejected");
        }
        let post = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            content: post.content,
            like_count: 0,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> Result<bool> {
        if self.reject_counter_updates.load(Ordering::SeqCst) {
            bail!("counter update rejected");
        }
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                post.like_count += delta;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_like_count(&self, post_id: Uuid, count: i64) -> Result<bool> {
        if self.reject_counter_updates.load(Ordering::SeqCst) {
            bail!("counter update rejected");
        }
        match self.posts.get_mut(&post_id) {
            Some(mut post) => {
                post.like_count = count;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .followers
            .get(&user_id)
            .map(|followers| followers.value().clone())
            .unwrap_or_default())
    }

    async fn get_posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|post| post.value().clone()))
            .collect())
    }

    async fn list_hot_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        posts.sort_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryRecordStore {
    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|user| user.value().clone()))
            .collect())
    }
}
