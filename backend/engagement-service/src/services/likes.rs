use crate::error::{ServiceError, ServiceResult};
use crate::metrics::metrics;
use crate::repository::PostStore;
use chrono::Utc;
use feed_store::{LikeSetStore, StoreKey};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Like registry: per-post liker set kept in step with the durable counter.
///
/// A toggle is two writes against two stores, counter first. The set write
/// only happens after the counter write succeeded; if it then fails the two
/// disagree until a later toggle or an explicit reconciliation. There is no
/// rollback.
#[derive(Clone)]
pub struct LikeRegistry {
    posts: Arc<dyn PostStore>,
    likes: Arc<dyn LikeSetStore>,
}

/// Outcome of an explicit counter reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeReconciliation {
    pub post_id: Uuid,
    pub previous_count: i64,
    pub reconciled_count: i64,
}

impl LikeReconciliation {
    pub fn drift(&self) -> i64 {
        self.previous_count - self.reconciled_count
    }
}

impl LikeRegistry {
    pub fn new(posts: Arc<dyn PostStore>, likes: Arc<dyn LikeSetStore>) -> Self {
        Self { posts, likes }
    }

    /// Flip the like state of `user_id` on `post_id`; returns the new state
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
        let key = StoreKey::post_likers(post_id);
        let member = user_id.to_string();

        let score = self
            .likes
            .score_of(&key, &member)
            .await
            .map_err(|e| ServiceError::unavailable("read like set", e))?;

        let liked = match score {
            None => {
                self.apply_counter(post_id, 1).await?;
                let now = Utc::now().timestamp_millis() as f64;
                if let Err(e) = self.likes.add_member(&key, &member, now).await {
                    return Err(self.record_drift(post_id, user_id, "add", e));
                }
                true
            }
            Some(_) => {
                self.apply_counter(post_id, -1).await?;
                if let Err(e) = self.likes.remove_member(&key, &member).await {
                    return Err(self.record_drift(post_id, user_id, "remove", e));
                }
                false
            }
        };

        metrics()
            .like_toggles
            .with_label_values(&[if liked { "liked" } else { "unliked" }])
            .inc();
        debug!(post_id = %post_id, user_id = %user_id, liked, "Like toggled");
        Ok(liked)
    }

    async fn apply_counter(&self, post_id: Uuid, delta: i64) -> ServiceResult<()> {
        let applied = self
            .posts
            .adjust_like_count(post_id, delta)
            .await
            .map_err(|e| ServiceError::write_failed("adjust like count", e))?;
        if !applied {
            metrics().like_toggles.with_label_values(&["not_found"]).inc();
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }
        Ok(())
    }

    fn record_drift(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        op: &str,
        err: feed_store::StoreError,
    ) -> ServiceError {
        warn!(
            post_id = %post_id,
            user_id = %user_id,
            op = op,
            error = %err,
            "Like counter updated but like set write failed; counter and set now disagree"
        );
        metrics().like_drift.inc();
        ServiceError::write_failed("update like set", err)
    }

    /// Up to `n` likers, earliest first
    pub async fn top_likers(&self, post_id: Uuid, n: usize) -> ServiceResult<Vec<Uuid>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let key = StoreKey::post_likers(post_id);
        let members = self
            .likes
            .range_asc_by_score(&key, 0, n - 1)
            .await
            .map_err(|e| ServiceError::unavailable("read like set", e))?;

        Ok(members
            .iter()
            .filter_map(|member| match Uuid::parse_str(member) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(post_id = %post_id, member = %member, "Skipping malformed liker id");
                    None
                }
            })
            .collect())
    }

    /// Membership test; anonymous callers have liked nothing
    pub async fn is_liked_by(&self, post_id: Uuid, user_id: Option<Uuid>) -> ServiceResult<bool> {
        let Some(user_id) = user_id else {
            return Ok(false);
        };

        let score = self
            .likes
            .score_of(&StoreKey::post_likers(post_id), &user_id.to_string())
            .await
            .map_err(|e| ServiceError::unavailable("read like set", e))?;
        Ok(score.is_some())
    }

    /// Overwrite the durable counter with the like-set cardinality.
    ///
    /// Operator-invoked only; toggles never call this.
    pub async fn reconcile_like_count(&self, post_id: Uuid) -> ServiceResult<LikeReconciliation> {
        let post = self
            .posts
            .get_post(post_id)
            .await
            .map_err(|e| ServiceError::unavailable("load post", e))?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        let members = self
            .likes
            .cardinality(&StoreKey::post_likers(post_id))
            .await
            .map_err(|e| ServiceError::unavailable("read like set", e))?;
        let reconciled_count = members as i64;

        if !self
            .posts
            .set_like_count(post_id, reconciled_count)
            .await
            .map_err(|e| ServiceError::write_failed("set like count", e))?
        {
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }

        let outcome = LikeReconciliation {
            post_id,
            previous_count: post.like_count,
            reconciled_count,
        };
        info!(
            post_id = %post_id,
            previous = outcome.previous_count,
            reconciled = outcome.reconciled_count,
            "Reconciled like count from like set"
        );
        Ok(outcome)
    }
}
