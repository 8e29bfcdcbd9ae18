use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engagement_service::config::Config;
use engagement_service::handlers;
use engagement_service::metrics::{register_all, serve_metrics};
use engagement_service::repository::PgRecordStore;
use engagement_service::services::FeedService;
use engagement_service::workers::redis_health;
use feed_store::RedisSortedSets;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting engagement-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        http_port = config.app.http_port,
        page_size = config.feed.page_size,
        fanout_concurrency = config.feed.fanout_concurrency,
        "Configuration loaded"
    );

    // Statement caching disabled for PgBouncer transaction mode
    let connect_options = PgConnectOptions::from_str(&config.database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database pool ready and migrations applied");

    let sorted_sets = Arc::new(
        RedisSortedSets::connect(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?
            .with_command_timeout(config.redis.command_timeout()),
    );
    info!(
        command_timeout_ms = config.redis.command_timeout_ms,
        "Redis connection established"
    );

    register_all(prometheus::default_registry()).context("Failed to register metrics")?;

    let health_store = sorted_sets.clone();
    tokio::spawn(async move {
        redis_health::start_redis_health_check(
            health_store,
            redis_health::RedisHealthConfig::default(),
        )
        .await;
    });

    let records = Arc::new(PgRecordStore::new(pg_pool.clone()));
    let feed_service = web::Data::new(FeedService::new(
        records.clone(),
        records,
        sorted_sets.clone(),
        sorted_sets,
        config.feed.clone(),
    ));

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!(addr = %http_addr, "Starting HTTP server");

    let ready_pool = pg_pool.clone();
    HttpServer::new(move || {
        let ready_pool = ready_pool.clone();
        App::new()
            .app_data(feed_service.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .route(
                "/ready",
                web::get().to(move || {
                    let pool = ready_pool.clone();
                    async move {
                        match sqlx::query("SELECT 1").execute(&pool).await {
                            Ok(_) => HttpResponse::Ok().body("READY"),
                            Err(e) => HttpResponse::ServiceUnavailable().body(e.to_string()),
                        }
                    }
                }),
            )
            .route("/metrics", web::get().to(serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    pg_pool.close().await;
    info!("engagement-service shut down");
    Ok(())
}
