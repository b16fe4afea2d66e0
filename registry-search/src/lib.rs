use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use depot_registry_core::{ErrorResponse, PublicErrorType};
use depot_scope::{Key, Scope};
use std::sync::Arc;

pub mod index;
pub mod routes;

pub use index::{MemSearchIndex, SearchIndex};
pub use routes::configure;

/// Scope binding for the process search index.
pub const SEARCH_INDEX: Key<Arc<dyn SearchIndex>> = Key::new("search-index");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("search index is not ready")]
    NotReady,

    #[error("database error: {0}")]
    Database(#[from] depot_registry_db::Error),

    #[error("scope error: {0}")]
    Scope(#[from] depot_scope::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Resolves the search index bound in `scope`.
pub fn search_index(scope: &Scope) -> Result<Arc<dyn SearchIndex>> {
    Ok(scope.require(&SEARCH_INDEX)?)
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::Scope(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let response = match self {
            Error::NotReady => {
                ErrorResponse::from_public_error(
                    PublicErrorType::SearchUnavailable,
                    Some(self.to_string()),
                )
            },
            _ => {
                tracing::error!("search request failed: {self:?}");
                ErrorResponse::internal()
            },
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}
