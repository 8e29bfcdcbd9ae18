use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::ServiceResult;
use crate::identity::Actor;
use crate::services::FeedService;

/// Cursor echoed back from the previous page; omit `max_score` to start
#[derive(Debug, Deserialize)]
pub struct ScrollQuery {
    pub max_score: Option<i64>,
    #[serde(default)]
    pub offset: usize,
}

#[get("/feed")]
pub async fn scroll_feed(
    req: HttpRequest,
    query: web::Query<ScrollQuery>,
    service: web::Data<FeedService>,
) -> ServiceResult<HttpResponse> {
    let actor = Actor::from_request(&req)?;
    let page = service
        .scroll_feed(&actor, query.max_score, query.offset)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
