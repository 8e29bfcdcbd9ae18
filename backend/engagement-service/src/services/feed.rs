use crate::config::FeedConfig;
use crate::domain::{FeedPage, LikeState, NewPost, Post, PostView, PublishRequest, UserSummary};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::IdentityProvider;
use crate::repository::{PostStore, UserDirectory};
use crate::services::fanout::FanoutWriter;
use crate::services::likes::LikeRegistry;
use crate::services::scroll::{ScrollCursor, ScrollEngine};
use feed_store::{LikeSetStore, TimelineStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Feed assembly: the produced API.
///
/// The only component that sees the caller's identity; everything below it
/// takes plain user ids.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserDirectory>,
    likes: LikeRegistry,
    fanout: FanoutWriter,
    scroll: ScrollEngine,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserDirectory>,
        like_sets: Arc<dyn LikeSetStore>,
        timelines: Arc<dyn TimelineStore>,
        config: FeedConfig,
    ) -> Self {
        Self {
            likes: LikeRegistry::new(posts.clone(), like_sets),
            fanout: FanoutWriter::new(posts.clone(), timelines.clone())
                .with_concurrency(config.fanout_concurrency),
            scroll: ScrollEngine::new(timelines),
            posts,
            users,
            config,
        }
    }

    pub fn like_registry(&self) -> &LikeRegistry {
        &self.likes
    }

    /// Posts ordered by like count; `page` is 1-based
    pub async fn query_hot_posts(
        &self,
        identity: &dyn IdentityProvider,
        page: u32,
    ) -> ServiceResult<Vec<PostView>> {
        if page == 0 {
            return Err(ServiceError::InvalidInput("page starts at 1".to_string()));
        }
        let size = i64::from(self.config.hot_posts_page_size);
        let offset = i64::from(page - 1) * size;

        let posts = self
            .posts
            .list_hot_posts(size, offset)
            .await
            .map_err(|e| ServiceError::unavailable("list hot posts", e))?;

        Ok(self.hydrate(identity.current_user(), posts).await)
    }

    pub async fn query_post_by_id(
        &self,
        identity: &dyn IdentityProvider,
        post_id: Uuid,
    ) -> ServiceResult<PostView> {
        let post = self
            .posts
            .get_post(post_id)
            .await
            .map_err(|e| ServiceError::unavailable("load post", e))?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        let mut views = self.hydrate(identity.current_user(), vec![post]).await;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))
    }

    pub async fn toggle_like(
        &self,
        identity: &dyn IdentityProvider,
        post_id: Uuid,
    ) -> ServiceResult<LikeState> {
        let user_id = identity.require_user()?;
        let liked = self.likes.toggle_like(post_id, user_id).await?;
        Ok(LikeState { post_id, liked })
    }

    /// Earliest likers of a post, as profiles
    pub async fn query_likers(&self, post_id: Uuid) -> ServiceResult<Vec<UserSummary>> {
        let ids = self
            .likes
            .top_likers(post_id, self.config.top_likers_limit)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.users
            .get_users_by_ids(&ids)
            .await
            .map_err(|e| ServiceError::unavailable("load liker profiles", e))
    }

    /// Persist a post authored by the caller and fan it out to followers
    pub async fn publish(
        &self,
        identity: &dyn IdentityProvider,
        request: PublishRequest,
    ) -> ServiceResult<Uuid> {
        let author_id = identity.require_user()?;
        if request.content.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "post content is empty".to_string(),
            ));
        }

        let published = self
            .fanout
            .publish(NewPost {
                author_id,
                content: request.content,
            })
            .await?;
        Ok(published.post.id)
    }

    /// One page of the caller's timeline.
    ///
    /// `max_score` is `None` for the first page; afterwards pass back the
    /// previous page's `min_time` and `offset`.
    pub async fn scroll_feed(
        &self,
        identity: &dyn IdentityProvider,
        max_score: Option<i64>,
        offset: usize,
    ) -> ServiceResult<FeedPage> {
        let user_id = identity.require_user()?;
        let cursor = match max_score {
            Some(max_score) => ScrollCursor::new(max_score, offset),
            None => ScrollCursor::start(),
        };

        let page = self
            .scroll
            .scroll(user_id, cursor, self.config.page_size)
            .await?;

        let ids: Vec<Uuid> = page.entries.iter().map(|entry| entry.post_id).collect();
        let posts = if ids.is_empty() {
            Vec::new()
        } else {
            self.posts
                .get_posts_by_ids(&ids)
                .await
                .map_err(|e| ServiceError::unavailable("load timeline posts", e))?
        };
        if posts.len() < ids.len() {
            debug!(
                user_id = %user_id,
                missing = ids.len() - posts.len(),
                "Timeline references posts that no longer exist"
            );
        }

        Ok(FeedPage {
            posts: self.hydrate(Some(user_id), posts).await,
            min_time: page.next_cursor.max_score,
            offset: page.next_cursor.offset,
            exhausted: page.is_exhausted(),
        })
    }

    /// Attach author fields and like state, keeping the input order.
    ///
    /// Hydration degrades instead of failing: a profile or like-state lookup
    /// error leaves those fields empty.
    async fn hydrate(&self, viewer: Option<Uuid>, posts: Vec<Post>) -> Vec<PostView> {
        let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<Uuid, UserSummary> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            match self.users.get_users_by_ids(&author_ids).await {
                Ok(users) => users.into_iter().map(|u| (u.id, u)).collect(),
                Err(e) => {
                    warn!(error = %e, count = author_ids.len(), "Failed to load authors for hydration");
                    HashMap::new()
                }
            }
        };

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            let is_liked = match self.likes.is_liked_by(post.id, viewer).await {
                Ok(liked) => liked,
                Err(e) => {
                    warn!(post_id = %post.id, error = %e, "Like state unavailable during hydration");
                    false
                }
            };
            let author = authors.get(&post.author_id);
            views.push(PostView {
                author_nickname: author.map(|a| a.nickname.clone()),
                author_icon: author.and_then(|a| a.icon.clone()),
                is_liked,
                post,
            });
        }
        views
    }
}
