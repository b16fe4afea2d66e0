//! Shared helpers for harness integration tests
//!
//! Provides an echo handler that reports what the pipeline received, and
//! fixtures for deliberately inconsistent data.

#![allow(dead_code)]

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use depot_harness::{Baseline, Handler, Scope};
use depot_registry_db::fixtures;
use depot_scope::Key;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bound by echo handlers inside their request scope.
pub const MARKER: Key<String> = Key::new("marker");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScopeInfo {
    pub id: u64,
    pub depth: usize,
    pub inherited_marker: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[get("/scope")]
async fn scope_info(scope: web::Data<Scope>) -> HttpResponse {
    let info = ScopeInfo {
        id: scope.id(),
        depth: scope.depth(),
        inherited_marker: scope.get(&MARKER),
    };
    scope.set(&MARKER, format!("request-{}", scope.id()));

    HttpResponse::Ok().json(info)
}

#[get("/boom")]
async fn boom() -> HttpResponse {
    HttpResponse::InternalServerError()
        .insert_header(("retry-after", "30"))
        .body("db password is hunter2")
}

async fn echo(
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    HttpResponse::Ok().json(Echo {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        authorization,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

#[post("/echo")]
async fn echo_post(
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    echo(req, body).await
}

/// Routes that report what the pipeline saw
pub fn echo_handler() -> Handler {
    Arc::new(|cfg: &mut web::ServiceConfig| {
        cfg.service(scope_info)
            .service(boom)
            .service(echo_post)
            .route("/echo", web::get().to(echo))
            .route("/{tail:.*}", web::get().to(echo));
    })
}

/// The default baseline plus a version of a package that does not exist
pub fn dangling_baseline() -> Baseline {
    Baseline::default_baseline()
        .unwrap()
        .with_entity(
            fixtures::version("ghost")
                .version("1.0.0")
                .build(),
        )
}
