//! Score + tie-offset cursor pagination over a personal timeline.
//!
//! A page is "entries with score <= max_score, newest first, skipping
//! `offset` entries that sit exactly at max_score". The next cursor is the
//! lowest score in the page plus how many entries at that score have been
//! consumed so far, so paging never skips or repeats an entry below the
//! cursor even when many entries share one timestamp.
//!
//! Entries inserted above the cursor while a client is scrolling are not
//! picked up by that scroll; a fresh scroll from [`ScrollCursor::start`]
//! sees them.

use crate::error::{ServiceError, ServiceResult};
use feed_store::{ScoreBound, StoreKey, TimelineStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Client-held resumption token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollCursor {
    pub max_score: i64,
    pub offset: usize,
}

impl ScrollCursor {
    /// Returned once the timeline is exhausted; scrolling from it stays empty
    pub const TERMINAL: ScrollCursor = ScrollCursor {
        max_score: i64::MIN,
        offset: 0,
    };

    /// Cursor for the first page
    pub fn start() -> Self {
        Self {
            max_score: i64::MAX,
            offset: 0,
        }
    }

    pub fn new(max_score: i64, offset: usize) -> Self {
        Self { max_score, offset }
    }

    pub fn is_terminal(&self) -> bool {
        self.max_score == i64::MIN
    }

    fn bound(&self) -> ScoreBound {
        if self.max_score == i64::MAX {
            ScoreBound::Unbounded
        } else {
            ScoreBound::Inclusive(self.max_score as f64)
        }
    }
}

impl Default for ScrollCursor {
    fn default() -> Self {
        Self::start()
    }
}

/// Raw timeline entry, not yet hydrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRef {
    pub post_id: Uuid,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPage {
    pub entries: Vec<PostRef>,
    pub next_cursor: ScrollCursor,
}

impl ScrollPage {
    fn terminal() -> Self {
        Self {
            entries: Vec::new(),
            next_cursor: ScrollCursor::TERMINAL,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_cursor.is_terminal()
    }
}

#[derive(Clone)]
pub struct ScrollEngine {
    timelines: Arc<dyn TimelineStore>,
}

impl ScrollEngine {
    pub fn new(timelines: Arc<dyn TimelineStore>) -> Self {
        Self { timelines }
    }

    pub async fn scroll(
        &self,
        user_id: Uuid,
        cursor: ScrollCursor,
        page_size: usize,
    ) -> ServiceResult<ScrollPage> {
        if page_size == 0 {
            return Err(ServiceError::InvalidInput(
                "page size must be at least 1".to_string(),
            ));
        }
        if cursor.is_terminal() {
            return Ok(ScrollPage::terminal());
        }

        let key = StoreKey::timeline(user_id);
        let rows = self
            .timelines
            .range_by_score_desc(&key, cursor.bound(), cursor.offset, page_size)
            .await
            .map_err(|e| ServiceError::unavailable("read timeline", e))?;

        if rows.is_empty() {
            debug!(user_id = %user_id, ?cursor, "Timeline exhausted");
            return Ok(ScrollPage::terminal());
        }

        // Start from the incoming cursor so a page that ends on the score it
        // started at carries the earlier offset forward.
        let mut min_time = cursor.max_score;
        let mut os = cursor.offset;
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows {
            let score = row.score as i64;
            if score == min_time {
                os += 1;
            } else {
                min_time = score;
                os = 1;
            }

            match Uuid::parse_str(&row.member) {
                Ok(post_id) => entries.push(PostRef { post_id, score }),
                Err(_) => warn!(user_id = %user_id, member = %row.member, "Skipping malformed timeline member"),
            }
        }

        let next_cursor = ScrollCursor::new(min_time, os);
        debug!(
            user_id = %user_id,
            returned = entries.len(),
            next_max_score = next_cursor.max_score,
            next_offset = next_cursor.offset,
            "Timeline page"
        );

        Ok(ScrollPage {
            entries,
            next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_store::InMemorySortedSets;

    async fn timeline_with(user: Uuid, scores: &[i64]) -> (Arc<InMemorySortedSets>, Vec<Uuid>) {
        let sets = Arc::new(InMemorySortedSets::new());
        let mut ids = Vec::new();
        for score in scores {
            let id = Uuid::new_v4();
            sets.append_scored(&StoreKey::timeline(user), &id.to_string(), *score as f64)
                .await
                .unwrap();
            ids.push(id);
        }
        (sets, ids)
    }

    #[tokio::test]
    async fn test_tied_scores_split_across_pages() {
        let user = Uuid::new_v4();
        let (sets, ids) = timeline_with(user, &[10, 10, 10, 9, 8]).await;
        let engine = ScrollEngine::new(sets);

        let first = engine.scroll(user, ScrollCursor::start(), 2).await.unwrap();
        assert_eq!(
            first.entries.iter().map(|e| e.post_id).collect::<Vec<_>>(),
            vec![ids[0], ids[1]]
        );
        assert_eq!(first.next_cursor, ScrollCursor::new(10, 2));

        let second = engine.scroll(user, first.next_cursor, 2).await.unwrap();
        assert_eq!(
            second.entries.iter().map(|e| e.post_id).collect::<Vec<_>>(),
            vec![ids[2], ids[3]]
        );
        assert_eq!(second.next_cursor, ScrollCursor::new(9, 1));

        let third = engine.scroll(user, second.next_cursor, 2).await.unwrap();
        assert_eq!(third.entries, vec![PostRef { post_id: ids[4], score: 8 }]);
        assert_eq!(third.next_cursor, ScrollCursor::new(8, 1));

        let done = engine.scroll(user, third.next_cursor, 2).await.unwrap();
        assert!(done.entries.is_empty());
        assert!(done.is_exhausted());
    }

    #[tokio::test]
    async fn test_offset_accumulates_within_one_score() {
        let user = Uuid::new_v4();
        let (sets, ids) = timeline_with(user, &[5, 5, 5, 5, 5]).await;
        let engine = ScrollEngine::new(sets);

        let first = engine.scroll(user, ScrollCursor::start(), 2).await.unwrap();
        assert_eq!(first.next_cursor, ScrollCursor::new(5, 2));
        let second = engine.scroll(user, first.next_cursor, 2).await.unwrap();
        assert_eq!(second.next_cursor, ScrollCursor::new(5, 4));
        let third = engine.scroll(user, second.next_cursor, 2).await.unwrap();
        assert_eq!(third.entries.len(), 1);
        assert_eq!(third.entries[0].post_id, ids[4]);
    }

    #[tokio::test]
    async fn test_empty_timeline_is_terminal_and_stays_empty() {
        let engine = ScrollEngine::new(Arc::new(InMemorySortedSets::new()));
        let user = Uuid::new_v4();

        let page = engine.scroll(user, ScrollCursor::start(), 3).await.unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.next_cursor, ScrollCursor::TERMINAL);

        let again = engine.scroll(user, page.next_cursor, 3).await.unwrap();
        assert!(again.entries.is_empty());
        assert!(again.is_exhausted());
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let engine = ScrollEngine::new(Arc::new(InMemorySortedSets::new()));
        let err = engine
            .scroll(Uuid::new_v4(), ScrollCursor::start(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
