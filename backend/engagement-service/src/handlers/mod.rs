//! Thin HTTP routes over [`FeedService`](crate::services::FeedService).
//!
//! Handlers only resolve the caller from the `X-User-Id` header and map
//! query/path parameters; every rule lives in the service.

pub mod feed;
pub mod posts;

use actix_web::web;

pub use feed::{scroll_feed, ScrollQuery};
pub use posts::{
    get_post, hot_posts, list_likers, publish_post, reconcile_likes, toggle_like, HotPostsQuery,
};

/// Mount the API under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(scroll_feed)
            // `/posts/hot` must be registered ahead of `/posts/{post_id}`
            .service(hot_posts)
            .service(publish_post)
            .service(get_post)
            .service(toggle_like)
            .service(list_likers)
            .service(reconcile_likes),
    );
}
