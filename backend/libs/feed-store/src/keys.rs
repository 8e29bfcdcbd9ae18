//! Key schema for sorted sets
//!
//! Key format: v{VERSION}:{entity}:{identifier}

use uuid::Uuid;

/// Key schema version - increment when changing key formats
pub const KEY_VERSION: u32 = 1;

/// Sorted-set key builder
pub struct StoreKey;

impl StoreKey {
    /// Personal timeline (feed inbox) of a user
    /// Format: v1:feed:{user_id}
    pub fn timeline(user_id: Uuid) -> String {
        format!("v{}:feed:{}", KEY_VERSION, user_id)
    }

    /// Users who liked a post, scored by like time
    /// Format: v1:liked:{post_id}
    pub fn post_likers(post_id: Uuid) -> String {
        format!("v{}:liked:{}", KEY_VERSION, post_id)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        let mut parts = key.split(':');
        parts.next()?;
        parts.next()
    }
}
