use crate::{
    LikeSetStore, ScoreBound, ScoredMember, StoreError, StoreMetrics, StoreResult, TimelineStore,
};
use dashmap::{DashMap, DashSet};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

#[derive(Debug, Clone)]
struct Entry {
    member: String,
    score: f64,
    seq: u64,
}

/// Process-local sorted sets
///
/// Members that share a score keep their insertion order in both directions.
/// Writes to keys under a rejected prefix fail with [`StoreError::Rejected`],
/// which lets callers exercise partial-failure paths.
#[derive(Default)]
pub struct InMemorySortedSets {
    sets: DashMap<String, Vec<Entry>>,
    rejected_prefixes: DashSet<String>,
    seq: AtomicU64,
    metrics: StoreMetrics,
}

impl InMemorySortedSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write to keys starting with `prefix`
    pub fn reject_writes_to(&self, prefix: impl Into<String>) {
        self.rejected_prefixes.insert(prefix.into());
    }

    pub fn clear_rejections(&self) {
        self.rejected_prefixes.clear();
    }

    /// Number of members under `key`
    pub fn len(&self, key: &str) -> usize {
        self.sets.get(key).map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    /// Score of a member, regardless of which trait view is used
    pub fn peek_score(&self, key: &str, member: &str) -> Option<f64> {
        self.sets
            .get(key)
            .and_then(|set| set.iter().find(|e| e.member == member).map(|e| e.score))
    }

    fn check_write(&self, key: &str) -> StoreResult<()> {
        if self
            .rejected_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            self.metrics.record_error(key, "rejected");
            return Err(StoreError::Rejected(key.to_string()));
        }
        Ok(())
    }

    fn upsert(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        if score.is_nan() {
            return Err(StoreError::InvalidScore {
                member: member.to_string(),
                score,
            });
        }
        self.check_write(key)?;

        let mut set = self.sets.entry(key.to_string()).or_default();
        match set.iter_mut().find(|e| e.member == member) {
            Some(existing) => existing.score = score,
            None => set.push(Entry {
                member: member.to_string(),
                score,
                seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            }),
        }
        self.metrics.record_write(key, "zadd");
        Ok(())
    }

    fn sorted(&self, key: &str, descending: bool) -> Vec<Entry> {
        let mut entries = self
            .sets
            .get(key)
            .map(|set| set.value().clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| {
            let by_score = a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal);
            let by_score = if descending { by_score.reverse() } else { by_score };
            by_score.then(a.seq.cmp(&b.seq))
        });
        entries
    }
}

#[async_trait::async_trait]
impl TimelineStore for InMemorySortedSets {
    async fn append_scored(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        self.upsert(key, member, score)
    }

    async fn range_by_score_desc(
        &self,
        key: &str,
        max: ScoreBound,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<ScoredMember>> {
        self.metrics.record_read(key, "zrevrangebyscore");
        Ok(self
            .sorted(key, true)
            .into_iter()
            .filter(|e| max.admits(e.score))
            .skip(skip)
            .take(limit)
            .map(|e| ScoredMember::new(e.member, e.score))
            .collect())
    }
}

#[async_trait::async_trait]
impl LikeSetStore for InMemorySortedSets {
    async fn add_member(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        self.upsert(key, member, score)
    }

    async fn remove_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.check_write(key)?;
        let removed = match self.sets.get_mut(key) {
            Some(mut set) => {
                let before = set.len();
                set.retain(|e| e.member != member);
                set.len() < before
            }
            None => false,
        };
        self.metrics.record_write(key, "zrem");
        Ok(removed)
    }

    async fn score_of(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        self.metrics.record_read(key, "zscore");
        Ok(self.peek_score(key, member))
    }

    async fn range_asc_by_score(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> StoreResult<Vec<String>> {
        self.metrics.record_read(key, "zrange");
        if stop < start {
            return Ok(Vec::new());
        }
        Ok(self
            .sorted(key, false)
            .into_iter()
            .skip(start)
            .take(stop - start + 1)
            .map(|e| e.member)
            .collect())
    }

    async fn cardinality(&self, key: &str) -> StoreResult<u64> {
        self.metrics.record_read(key, "zcard");
        Ok(self.len(key) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_desc_range_keeps_insertion_order_within_score() {
        let store = InMemorySortedSets::new();
        for (member, score) in [("a", 10.0), ("b", 10.0), ("c", 9.0), ("d", 10.0)] {
            store.append_scored("v1:feed:u", member, score).await.unwrap();
        }

        let page = store
            .range_by_score_desc("v1:feed:u", ScoreBound::Unbounded, 0, 10)
            .await
            .unwrap();
        let members: Vec<&str> = page.iter().map(|m| m.member.as_str()).collect();
        assert_eq!(members, vec!["a", "b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_desc_range_applies_bound_skip_and_limit() {
        let store = InMemorySortedSets::new();
        for (member, score) in [("a", 12.0), ("b", 10.0), ("c", 10.0), ("d", 8.0)] {
            store.append_scored("k", member, score).await.unwrap();
        }

        let page = store
            .range_by_score_desc("k", ScoreBound::Inclusive(10.0), 1, 2)
            .await
            .unwrap();
        assert_eq!(
            page,
            vec![ScoredMember::new("c", 10.0), ScoredMember::new("d", 8.0)]
        );
    }

    #[tokio::test]
    async fn test_like_set_membership() {
        let store = InMemorySortedSets::new();
        store.add_member("v1:liked:p", "x", 1.0).await.unwrap();
        store.add_member("v1:liked:p", "y", 2.0).await.unwrap();

        assert_eq!(store.score_of("v1:liked:p", "x").await.unwrap(), Some(1.0));
        assert_eq!(store.cardinality("v1:liked:p").await.unwrap(), 2);
        assert!(store.remove_member("v1:liked:p", "x").await.unwrap());
        assert!(!store.remove_member("v1:liked:p", "x").await.unwrap());
        assert_eq!(
            store.range_asc_by_score("v1:liked:p", 0, 4).await.unwrap(),
            vec!["y".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejected_prefix_fails_writes_only() {
        let store = InMemorySortedSets::new();
        store.add_member("v1:liked:p", "x", 1.0).await.unwrap();
        store.reject_writes_to("v1:liked:");

        let err = store.add_member("v1:liked:p", "y", 2.0).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.score_of("v1:liked:p", "x").await.unwrap(), Some(1.0));

        store.clear_rejections();
        store.add_member("v1:liked:p", "y", 2.0).await.unwrap();
        assert_eq!(store.len("v1:liked:p"), 2);
    }

    #[tokio::test]
    async fn test_nan_score_is_rejected() {
        let store = InMemorySortedSets::new();
        let err = store.append_scored("k", "a", f64::NAN).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidScore { .. }));
    }
}
