use crate::domain::{NewPost, Post};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::metrics;
use crate::repository::PostStore;
use feed_store::{StoreKey, TimelineStore};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// What fan-out reached for one published post.
///
/// A partial fan-out is not an error: the post is durable, and the
/// followers listed in `failed` simply never see it in their timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: Vec<Uuid>,
    pub follower_lookup_failed: bool,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.follower_lookup_failed
    }
}

#[derive(Debug, Clone)]
pub struct Published {
    pub post: Post,
    pub fanout: FanoutReport,
}

/// Fan-out-on-write: persist the post, then push it into every follower's
/// timeline scored by publish time.
///
/// Appends run with bounded concurrency and are independent of each other;
/// one follower's failure neither aborts the others nor rolls back the post.
/// Nothing is retried. `publish` returns once every append has finished.
#[derive(Clone)]
pub struct FanoutWriter {
    posts: Arc<dyn PostStore>,
    timelines: Arc<dyn TimelineStore>,
    concurrency: usize,
}

impl FanoutWriter {
    pub fn new(posts: Arc<dyn PostStore>, timelines: Arc<dyn TimelineStore>) -> Self {
        Self {
            posts,
            timelines,
            concurrency: 16,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn publish(&self, new_post: NewPost) -> ServiceResult<Published> {
        let post = self
            .posts
            .insert_post(new_post)
            .await
            .map_err(|e| ServiceError::write_failed("insert post", e))?;

        let fanout = self.fan_out(&post).await;

        if fanout.is_complete() {
            info!(
                post_id = %post.id,
                author_id = %post.author_id,
                delivered = fanout.delivered,
                "Post published and fanned out"
            );
        } else {
            metrics().partial_fanouts.inc();
            warn!(
                post_id = %post.id,
                author_id = %post.author_id,
                delivered = fanout.delivered,
                failed = fanout.failed.len(),
                follower_lookup_failed = fanout.follower_lookup_failed,
                "Partial fan-out: some follower timelines did not receive the post"
            );
        }

        Ok(Published { post, fanout })
    }

    async fn fan_out(&self, post: &Post) -> FanoutReport {
        let followers = match self.posts.list_followers(post.author_id).await {
            Ok(followers) => followers,
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Failed to load followers for fan-out");
                return FanoutReport {
                    follower_lookup_failed: true,
                    ..Default::default()
                };
            }
        };

        let member = post.id.to_string();
        let score = post.publish_score() as f64;

        let results: Vec<(Uuid, bool)> = stream::iter(followers)
            .map(|follower_id| {
                let timelines = self.timelines.clone();
                let member = member.clone();
                async move {
                    let key = StoreKey::timeline(follower_id);
                    match timelines.append_scored(&key, &member, score).await {
                        Ok(()) => (follower_id, true),
                        Err(e) => {
                            warn!(
                                follower_id = %follower_id,
                                post_id = %member,
                                error = %e,
                                "Timeline append failed"
                            );
                            (follower_id, false)
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = FanoutReport::default();
        for (follower_id, ok) in results {
            if ok {
                report.delivered += 1;
            } else {
                report.failed.push(follower_id);
            }
        }
        metrics().fanout_deliveries.inc_by(report.delivered as u64);
        metrics().fanout_failures.inc_by(report.failed.len() as u64);
        report
    }
}
