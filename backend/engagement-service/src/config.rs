/// Configuration management for Engagement Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Feed and like tuning
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// Per-command timeout in milliseconds
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl RedisConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Feed and like tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Entries per scroll page
    pub page_size: usize,
    /// Posts per hot-posts page
    pub hot_posts_page_size: u32,
    /// How many likers `query_likers` returns
    pub top_likers_limit: usize,
    /// Follower timelines written concurrently during fan-out
    pub fanout_concurrency: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 3,
            hot_posts_page_size: 10,
            top_likers_limit: 5,
            fanout_concurrency: 16,
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_command_timeout_ms() -> u64 {
    500
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_or("PORT", 8010),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections()),
            min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections()),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").context("REDIS_URL environment variable not set")?,
            command_timeout_ms: env_or("REDIS_COMMAND_TIMEOUT_MS", default_command_timeout_ms()),
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            page_size: env_or("FEED_PAGE_SIZE", defaults.page_size).max(1),
            hot_posts_page_size: env_or("HOT_POSTS_PAGE_SIZE", defaults.hot_posts_page_size)
                .max(1),
            top_likers_limit: env_or("TOP_LIKERS_LIMIT", defaults.top_likers_limit).max(1),
            fanout_concurrency: env_or("FANOUT_CONCURRENCY", defaults.fanout_concurrency).max(1),
        };

        Ok(Config {
            app,
            database,
            redis,
            feed,
        })
    }
}
