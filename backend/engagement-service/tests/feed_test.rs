mod common;

use chrono::Utc;
use common::Harness;
use engagement_service::domain::{Post, PublishRequest};
use engagement_service::error::ServiceError;
use engagement_service::identity::Actor;
use feed_store::{StoreKey, TimelineStore};
use std::collections::HashSet;
use uuid::Uuid;

#[tokio::test]
async fn test_fanout_reaches_followers_only() {
    let h = Harness::new();
    let a = h.user("a");
    let b = h.user("b");
    let c = h.user("c");
    let stranger = h.user("stranger");
    h.follow(b, a);
    h.follow(c, a);

    let post_id = h.publish(a, "to my followers").await;
    let post = h
        .service
        .query_post_by_id(&Actor::Anonymous, post_id)
        .await
        .unwrap()
        .post;
    let expected = post.created_at.timestamp_millis() as f64;
    let member = post_id.to_string();

    assert_eq!(h.sets.peek_score(&StoreKey::timeline(b), &member), Some(expected));
    assert_eq!(h.sets.peek_score(&StoreKey::timeline(c), &member), Some(expected));
    assert!(h.sets.is_empty(&StoreKey::timeline(stranger)));
    assert!(h.sets.is_empty(&StoreKey::timeline(a)));
}

#[tokio::test]
async fn test_partial_fanout_keeps_post_and_other_followers() {
    let h = Harness::new();
    let a = h.user("a");
    let b = h.user("b");
    let c = h.user("c");
    h.follow(b, a);
    h.follow(c, a);
    h.sets.reject_writes_to(StoreKey::timeline(b));

    let post_id = h.publish(a, "partly delivered").await;

    assert!(h.sets.is_empty(&StoreKey::timeline(b)));
    assert!(h
        .sets
        .peek_score(&StoreKey::timeline(c), &post_id.to_string())
        .is_some());
    assert!(h
        .service
        .query_post_by_id(&Actor::Anonymous, post_id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_rejected_post_is_not_fanned_out() {
    let h = Harness::new();
    let a = h.user("a");
    let b = h.user("b");
    h.follow(b, a);
    h.records.reject_inserts(true);

    let err = h
        .service
        .publish(
            &Actor::User(a),
            PublishRequest {
                content: "lost".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::WriteFailed(_)));
    assert!(h.sets.is_empty(&StoreKey::timeline(b)));
}

#[tokio::test]
async fn test_publish_requires_identity_and_content() {
    let h = Harness::new();
    let a = h.user("a");

    let err = h
        .service
        .publish(
            &Actor::Anonymous,
            PublishRequest {
                content: "who am i".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let err = h
        .service
        .publish(
            &Actor::User(a),
            PublishRequest {
                content: "   ".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_scroll_visits_every_post_once() {
    let h = Harness::new();
    let reader = h.user("reader");
    let authors: Vec<Uuid> = (0..3).map(|i| h.user(&format!("author{}", i))).collect();
    for author in &authors {
        h.follow(reader, *author);
    }

    let mut published = HashSet::new();
    for i in 0..10 {
        let author = authors[i % authors.len()];
        published.insert(h.publish(author, &format!("post {}", i)).await);
    }

    let actor = Actor::User(reader);
    let mut seen = Vec::new();
    let mut cursor: Option<(i64, usize)> = None;
    let mut last_time = i64::MAX;
    for _ in 0..20 {
        let page = match cursor {
            None => h.service.scroll_feed(&actor, None, 0).await.unwrap(),
            Some((max, os)) => h.service.scroll_feed(&actor, Some(max), os).await.unwrap(),
        };
        if page.exhausted {
            assert!(page.posts.is_empty());
            break;
        }
        assert!(page.posts.len() <= 3);
        for view in &page.posts {
            let time = view.post.created_at.timestamp_millis();
            assert!(time <= last_time, "feed must be newest first");
            last_time = time;
            assert!(!view.is_liked);
            assert!(view.author_nickname.is_some());
            seen.push(view.post.id);
        }
        cursor = Some((page.min_time, page.offset));
    }

    assert_eq!(seen.len(), published.len());
    let unique: HashSet<Uuid> = seen.into_iter().collect();
    assert_eq!(unique, published);
}

#[tokio::test]
async fn test_scroll_through_one_shared_timestamp() {
    let h = Harness::new();
    let reader = h.user("reader");
    let author = h.user("author");
    let created_at = Utc::now();
    let score = created_at.timestamp_millis();

    let mut ids = Vec::new();
    for i in 0..5 {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author,
            content: format!("burst {}", i),
            like_count: 0,
            created_at,
        };
        ids.push(post.id);
        h.sets
            .append_scored(&StoreKey::timeline(reader), &post.id.to_string(), score as f64)
            .await
            .unwrap();
        h.records.seed_post(post);
    }

    let actor = Actor::User(reader);
    let first = h.service.scroll_feed(&actor, None, 0).await.unwrap();
    assert_eq!(first.posts.len(), 3);
    assert_eq!((first.min_time, first.offset), (score, 3));

    let second = h
        .service
        .scroll_feed(&actor, Some(first.min_time), first.offset)
        .await
        .unwrap();
    assert_eq!(second.posts.len(), 2);
    assert_eq!((second.min_time, second.offset), (score, 5));

    let third = h
        .service
        .scroll_feed(&actor, Some(second.min_time), second.offset)
        .await
        .unwrap();
    assert!(third.posts.is_empty());
    assert!(third.exhausted);

    let seen: Vec<Uuid> = first
        .posts
        .iter()
        .chain(second.posts.iter())
        .map(|v| v.post.id)
        .collect();
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn test_empty_feed_is_terminal_on_first_call() {
    let h = Harness::new();
    let reader = h.user("reader");

    let page = h
        .service
        .scroll_feed(&Actor::User(reader), None, 0)
        .await
        .unwrap();
    assert!(page.posts.is_empty());
    assert!(page.exhausted);
}

#[tokio::test]
async fn test_anonymous_cannot_scroll() {
    let h = Harness::new();
    let err = h
        .service
        .scroll_feed(&Actor::Anonymous, None, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn test_deleted_post_is_skipped_in_feed() {
    let h = Harness::new();
    let reader = h.user("reader");
    let author = h.user("author");
    h.follow(reader, author);
    let kept = h.publish(author, "kept").await;
    let gone = h.publish(author, "gone").await;
    h.records.remove_post(gone);

    let page = h
        .service
        .scroll_feed(&Actor::User(reader), None, 0)
        .await
        .unwrap();
    let ids: Vec<Uuid> = page.posts.iter().map(|v| v.post.id).collect();
    assert_eq!(ids, vec![kept]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_land_in_one_timeline() {
    let h = Harness::new();
    let reader = h.user("reader");
    let authors: Vec<Uuid> = (0..12).map(|i| h.user(&format!("a{}", i))).collect();
    for author in &authors {
        h.follow(reader, *author);
    }

    let mut handles = Vec::new();
    for author in authors {
        let service = h.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .publish(
                    &Actor::User(author),
                    PublishRequest {
                        content: format!("from {}", author),
                    },
                )
                .await
        }));
    }

    let mut published = HashSet::new();
    for handle in handles {
        published.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(published.len(), 12);
    assert_eq!(h.sets.len(&StoreKey::timeline(reader)), 12);
}
