use crate::Error;
use actix_web::{FromRequest, http::header::AUTHORIZATION, web};
use depot_registry_db::entities::User;
use depot_scope::Scope;
use futures::future::LocalBoxFuture;

/// The authenticated user behind a request.
///
/// Requests authenticate with `Authorization: Bearer <user-id>`.
pub struct Principal {
    pub user: User,
}

impl std::ops::Deref for Principal {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

fn bearer_token(req: &actix_web::HttpRequest) -> crate::Result<String> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Error::AuthorizationRequired)?;

    let token = header
        .to_str()
        .map_err(|_| Error::InvalidToken)?
        .strip_prefix("Bearer ")
        .ok_or(Error::InvalidToken)?
        .trim();

    if token.is_empty() {
        return Err(Error::InvalidToken);
    }

    Ok(token.to_string())
}

impl FromRequest for Principal {
    type Error = crate::Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let token = bearer_token(req);
        let scope = req.app_data::<web::Data<Scope>>().cloned();

        Box::pin(async move {
            let scope = scope.ok_or_else(|| Error::missing_data("Scope"))?;
            let token = token?;
            let db = depot_registry_db::datastore(&scope)?;

            match User::by_id(db.as_ref(), &token).await {
                Ok(user) => Ok(Self { user }),
                Err(depot_registry_db::Error::NotFound(_)) => {
                    tracing::debug!("bearer token does not name a user");
                    Err(Error::InvalidToken)
                },
                Err(err) => Err(err.into()),
            }
        })
    }
}
