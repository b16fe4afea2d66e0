use crate::{config::registry_config, principal::Principal};
use actix_web::{Responder, get, web};
use depot_registry_core::models::SessionInfo;
use depot_scope::Scope;

/// The caller's identity
#[get("/api/account/session")]
pub async fn session(
    principal: Principal,
    scope: web::Data<Scope>,
) -> crate::Result<impl Responder> {
    let is_admin = registry_config(&scope).is_admin(&principal.email);

    Ok(web::Json(SessionInfo {
        user_id: principal.user.id,
        email: principal.user.email,
        is_admin,
    }))
}
