//! Store error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Invalid score for member {member}: {score}")]
    InvalidScore { member: String, score: f64 },
}

impl StoreError {
    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Redis(_) => "redis",
            StoreError::Timeout(_) => "timeout",
            StoreError::Rejected(_) => "rejected",
            StoreError::InvalidScore { .. } => "invalid_score",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
