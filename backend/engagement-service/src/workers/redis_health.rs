//! Background ping for the sorted-set Redis connection.
//!
//! Keeps the connection manager warm during quiet periods so a stale TCP
//! connection surfaces here instead of as a failed toggle or fan-out append.

use feed_store::RedisSortedSets;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Consecutive failures after which the log level escalates to error
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

#[derive(Clone)]
pub struct RedisHealthConfig {
    pub enabled: bool,
    pub check_interval: Duration,
    pub initial_delay: Duration,
}

impl Default for RedisHealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: HEALTH_CHECK_INTERVAL,
            initial_delay: Duration::from_secs(10),
        }
    }
}

pub async fn start_redis_health_check(store: Arc<RedisSortedSets>, config: RedisHealthConfig) {
    if !config.enabled {
        tracing::info!("Redis health check disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.check_interval.as_secs(),
        "Starting Redis health check for engagement-service"
    );

    sleep(config.initial_delay).await;

    let mut consecutive_failures: u32 = 0;
    loop {
        match store.ping().await {
            Ok(()) => {
                if consecutive_failures > 0 {
                    tracing::info!(
                        previous_failures = consecutive_failures,
                        "Redis connection recovered"
                    );
                }
                consecutive_failures = 0;
                tracing::debug!("Redis health check: OK");
            }
            Err(e) => {
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    tracing::error!(
                        consecutive_failures,
                        error = %e,
                        "Redis health check: repeated failures, timelines and likes are degraded"
                    );
                } else {
                    tracing::warn!(consecutive_failures, error = %e, "Redis health check failed");
                }
            }
        }

        sleep(config.check_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisHealthConfig::default();
        assert!(config.enabled);
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.initial_delay, Duration::from_secs(10));
    }
}
