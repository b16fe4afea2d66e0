//! Search-service HTTP surface.

use crate::{Error, Result, search_index};
use actix_web::{HttpResponse, Responder, get, web};
use depot_registry_core::models::SearchQuery;
use depot_scope::Scope;
use serde::Serialize;

#[derive(Serialize)]
struct Readiness {
    ready: bool,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search).service(ready);
}

/// Ranked package search
#[get("/search")]
pub async fn search(
    scope: web::Data<Scope>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder> {
    let index = search_index(&scope)?;
    let results = index.search(&query).await?;

    Ok(web::Json(results))
}

/// 200 once the index serves queries, 503 before
#[get("/ready")]
pub async fn ready(scope: web::Data<Scope>) -> Result<impl Responder> {
    if !search_index(&scope)?.is_ready() {
        return Err(Error::NotReady);
    }

    Ok(HttpResponse::Ok().json(Readiness { ready: true }))
}
