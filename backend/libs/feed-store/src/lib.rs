//! Sorted-set storage for personal timelines and like sets
//!
//! Two consumer-facing traits share one data structure (member + score):
//! - [`TimelineStore`]: per-user feed inbox, scored by publish time
//! - [`LikeSetStore`]: per-post likers, scored by like time
//!
//! Backends:
//! - [`RedisSortedSets`]: ZADD / ZREM / ZSCORE / ZRANGE / ZREVRANGEBYSCORE
//! - [`InMemorySortedSets`]: process-local, with write-failure injection

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_store;

pub use error::{StoreError, StoreResult};
pub use keys::{StoreKey, KEY_VERSION};
pub use memory::InMemorySortedSets;
pub use metrics::StoreMetrics;
pub use redis_store::RedisSortedSets;

/// Inclusive upper bound for a descending score range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// No upper bound (`+inf`)
    Unbounded,
    /// Scores less than or equal to this value
    Inclusive(f64),
}

impl ScoreBound {
    pub fn admits(&self, score: f64) -> bool {
        match self {
            ScoreBound::Unbounded => true,
            ScoreBound::Inclusive(max) => score <= *max,
        }
    }
}

/// A member with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

impl ScoredMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Per-user timeline operations
#[async_trait::async_trait]
pub trait TimelineStore: Send + Sync {
    /// Insert (or re-score) a member in the timeline
    async fn append_scored(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Members with score <= `max`, highest first, skipping `skip` then taking `limit`
    async fn range_by_score_desc(
        &self,
        key: &str,
        max: ScoreBound,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<ScoredMember>>;
}

/// Per-post like set operations
#[async_trait::async_trait]
pub trait LikeSetStore: Send + Sync {
    async fn add_member(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Returns true if the member was present
    async fn remove_member(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn score_of(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    /// Members by ascending score, ranks `start..=stop`
    async fn range_asc_by_score(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> StoreResult<Vec<String>>;

    async fn cardinality(&self, key: &str) -> StoreResult<u64>;
}
