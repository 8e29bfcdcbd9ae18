use crate::{
    LikeSetStore, ScoreBound, ScoredMember, StoreError, StoreMetrics, StoreResult, TimelineStore,
};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-command timeout
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Redis sorted-set backend
///
/// Every command runs under a per-command timeout so no caller blocks on a
/// stalled connection.
#[derive(Clone)]
pub struct RedisSortedSets {
    redis: ConnectionManager,
    command_timeout: Duration,
    metrics: StoreMetrics,
}

impl RedisSortedSets {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            metrics: StoreMetrics::new(),
        }
    }

    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    /// Connect and build a store from a Redis URL
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(manager))
    }

    /// Ping Redis to keep the connection manager warm
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.redis.clone();
        let _: String = self
            .run("ping", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn run<T, F>(&self, key: &str, command: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Redis command failed");
                self.metrics.record_error(key, "redis");
                Err(StoreError::Redis(e))
            }
            Err(_) => {
                warn!(key = %key, timeout_ms = self.command_timeout.as_millis() as u64, "Redis command timed out");
                self.metrics.record_error(key, "timeout");
                Err(StoreError::Timeout(self.command_timeout))
            }
        }
    }
}

fn max_arg(max: ScoreBound) -> String {
    match max {
        ScoreBound::Unbounded => "+inf".to_string(),
        ScoreBound::Inclusive(score) => score.to_string(),
    }
}

#[async_trait::async_trait]
impl TimelineStore for RedisSortedSets {
    async fn append_scored(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut conn = self.redis.clone();
        let _: () = self.run(key, conn.zadd(key, member, score)).await?;
        self.metrics.record_write(key, "zadd");
        Ok(())
    }

    async fn range_by_score_desc(
        &self,
        key: &str,
        max: ScoreBound,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<ScoredMember>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.redis.clone();
        let rows: Vec<(String, f64)> = self
            .run(
                key,
                conn.zrevrangebyscore_limit_withscores(
                    key,
                    max_arg(max),
                    "-inf",
                    skip as isize,
                    limit as isize,
                ),
            )
            .await?;
        self.metrics.record_read(key, "zrevrangebyscore");

        debug!(key = %key, skip, limit, returned = rows.len(), "Timeline range");
        Ok(rows
            .into_iter()
            .map(|(member, score)| ScoredMember { member, score })
            .collect())
    }
}

#[async_trait::async_trait]
impl LikeSetStore for RedisSortedSets {
    async fn add_member(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut conn = self.redis.clone();
        let _: () = self.run(key, conn.zadd(key, member, score)).await?;
        self.metrics.record_write(key, "zadd");
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.redis.clone();
        let removed: i64 = self.run(key, conn.zrem(key, member)).await?;
        self.metrics.record_write(key, "zrem");
        Ok(removed > 0)
    }

    async fn score_of(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        let mut conn = self.redis.clone();
        let score: Option<f64> = self.run(key, conn.zscore(key, member)).await?;
        self.metrics.record_read(key, "zscore");
        Ok(score)
    }

    async fn range_asc_by_score(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> StoreResult<Vec<String>> {
        let mut conn = self.redis.clone();
        let members: Vec<String> = self
            .run(key, conn.zrange(key, start as isize, stop as isize))
            .await?;
        self.metrics.record_read(key, "zrange");
        Ok(members)
    }

    async fn cardinality(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.redis.clone();
        let count: u64 = self.run(key, conn.zcard(key)).await?;
        self.metrics.record_read(key, "zcard");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_arg() {
        assert_eq!(max_arg(ScoreBound::Unbounded), "+inf");
        assert_eq!(
            max_arg(ScoreBound::Inclusive(1_700_000_000_000.0)),
            "1700000000000"
        );
    }
}
