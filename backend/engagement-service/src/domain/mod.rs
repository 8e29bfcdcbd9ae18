pub mod models;

pub use models::{
    FeedPage, FollowEdge, LikeState, NewPost, Post, PostView, PublishRequest, UserSummary,
};
