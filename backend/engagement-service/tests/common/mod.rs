#![allow(dead_code)]

use engagement_service::config::FeedConfig;
use engagement_service::domain::{FollowEdge, PublishRequest, UserSummary};
use engagement_service::identity::Actor;
use engagement_service::repository::InMemoryRecordStore;
use engagement_service::services::FeedService;
use feed_store::InMemorySortedSets;
use std::sync::Arc;
use uuid::Uuid;

/// Feed service wired to in-memory stores
pub struct Harness {
    pub records: Arc<InMemoryRecordStore>,
    pub sets: Arc<InMemorySortedSets>,
    pub service: FeedService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FeedConfig::default())
    }

    pub fn with_config(config: FeedConfig) -> Self {
        let records = Arc::new(InMemoryRecordStore::new());
        let sets = Arc::new(InMemorySortedSets::new());
        let service = FeedService::new(
            records.clone(),
            records.clone(),
            sets.clone(),
            sets.clone(),
            config,
        );
        Self {
            records,
            sets,
            service,
        }
    }

    pub fn user(&self, nickname: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.records.add_user(UserSummary {
            id,
            nickname: nickname.to_string(),
            icon: Some(format!("/icons/{}.png", nickname)),
        });
        id
    }

    pub fn follow(&self, follower: Uuid, followee: Uuid) {
        self.records.add_follow(FollowEdge {
            follower_id: follower,
            followee_id: followee,
        });
    }

    pub async fn publish(&self, author: Uuid, content: &str) -> Uuid {
        self.service
            .publish(
                &Actor::User(author),
                PublishRequest {
                    content: content.to_string(),
                },
            )
            .await
            .unwrap()
    }
}
