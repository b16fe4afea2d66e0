use actix_web::{Responder, get, web};
use depot_registry_client::SEARCH_CLIENT;
use depot_registry_core::models::SearchQuery;
use depot_scope::Scope;

/// Package search, answered by the search service
#[get("/api/search")]
pub async fn search_packages(
    scope: web::Data<Scope>,
    query: web::Query<SearchQuery>,
) -> crate::Result<impl Responder> {
    // an unbound client is a wiring fault, not an upstream failure
    let client = scope.require(&SEARCH_CLIENT)?;
    let results = client.search(&query).await?;

    Ok(web::Json(results))
}
