use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::PublishRequest;
use crate::error::ServiceResult;
use crate::identity::Actor;
use crate::services::FeedService;

#[derive(Debug, Deserialize)]
pub struct HotPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[get("/posts/hot")]
pub async fn hot_posts(
    req: HttpRequest,
    query: web::Query<HotPostsQuery>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let actor = Actor::from_request(&req)?;
    let posts = service.query_hot_posts(&actor, query.page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[post("/posts")]
pub async fn publish_post(
    req: HttpRequest,
    body: web::Json<PublishRequest>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let actor = Actor::from_request(&req)?;
    let post_id = service.publish(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "post_id": post_id })))
}

#[get("/posts/{post_id}")]
pub async fn get_post(
    req: HttpRequest,
    path: web::Path<Uuid>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let actor = Actor::from_request(&req)?;
    let view = service.query_post_by_id(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/posts/{post_id}/like")]
pub async fn toggle_like(
    req: HttpRequest,
    path: web::Path<Uuid>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let actor = Actor::from_request(&req)?;
    let state = service.toggle_like(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state))
}

#[get("/posts/{post_id}/likers")]
pub async fn list_likers(
    path: web::Path<Uuid>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let likers = service.query_likers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(likers))
}

/// Operator endpoint: rebuild the like counter from the like set
#[post("/admin/posts/{post_id}/reconcile-likes")]
pub async fn reconcile_likes(
    path: web::Path<Uuid>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let outcome = service
        .like_registry()
        .reconcile_like_count(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "post_id": outcome.post_id,
        "previous_count": outcome.previous_count,
        "reconciled_count": outcome.reconciled_count,
        "drift": outcome.drift(),
    })))
}
