use actix_web::{ResponseError, http::StatusCode};
use depot_registry_core::{ErrorResponse, PublicErrorType};

pub mod config;
pub mod middleware;
pub mod principal;
pub mod routes;

pub use config::{CONFIG, NewForConfig, RegistryConfig};
pub use routes::configure;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database error: {0:?}")]
    Database(#[from] depot_registry_db::Error),

    #[error("search error: {0}")]
    Search(#[from] depot_registry_client::Error),

    #[error("scope error: {0}")]
    Scope(#[from] depot_scope::Error),

    #[error("missing `web::Data<{data}>`")]
    MissingData { data: String },

    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("authorization failure")]
    AuthorizationRequired,

    #[error("invalid token")]
    InvalidToken,

    #[error("validation errors found")]
    ValidationErrors(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn missing_data(data: impl Into<String>) -> Self {
        Error::MissingData { data: data.into() }
    }

    fn search_unavailable(&self) -> bool {
        match self {
            Error::Search(depot_registry_client::Error::Closed) => true,
            Error::Search(err) => err.status().map(|s| s.as_u16()) == Some(StatusCode::SERVICE_UNAVAILABLE.as_u16()),
            _ => false,
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            Error::ValidationErrors(err) => {
                let mut fields: Vec<String> = err
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                fields.sort();

                ErrorResponse::from_public_error(
                    PublicErrorType::Validation,
                    Some(format!("invalid fields: {}", fields.join(", "))),
                )
            },
            Error::AuthorizationRequired => {
                ErrorResponse::from_public_error(
                    PublicErrorType::AuthorizationRequired,
                    Some("Authorization via Bearer token is required".to_string()),
                )
            },
            Error::InvalidToken => {
                ErrorResponse::from_public_error(
                    PublicErrorType::InvalidToken,
                    Some("The provided token is invalid".to_string()),
                )
            },
            Error::Database(depot_registry_db::Error::NotFound(what)) => {
                ErrorResponse::from_public_error(
                    PublicErrorType::NotFound,
                    Some(format!("{what} not found")),
                )
            },
            Error::Database(depot_registry_db::Error::Validation(msg)) => {
                ErrorResponse::from_public_error(PublicErrorType::Validation, Some(msg.clone()))
            },
            Error::Database(err @ depot_registry_db::Error::InvalidVersion { .. }) => {
                ErrorResponse::from_public_error(PublicErrorType::Validation, Some(err.to_string()))
            },
            err if err.search_unavailable() => {
                ErrorResponse::from_public_error(
                    PublicErrorType::SearchUnavailable,
                    Some("search is temporarily unavailable".to_string()),
                )
            },
            _ => ErrorResponse::internal(),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::ValidationErrors(_) => StatusCode::BAD_REQUEST,
            Error::AuthorizationRequired | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::Database(depot_registry_db::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Database(
                depot_registry_db::Error::Validation(_)
                | depot_registry_db::Error::InvalidVersion { .. },
            ) => StatusCode::BAD_REQUEST,
            err if err.search_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Error::Search(_) => StatusCode::BAD_GATEWAY,
            Error::Database(_) | Error::Scope(_) | Error::MissingData { .. } | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        if self.status_code().is_server_error() {
            tracing::error!("Handling error: {:?}", self);
        } else {
            tracing::debug!("Handling error: {:?}", self);
        }

        actix_web::HttpResponse::build(self.status_code()).json(self.to_error_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::AuthorizationRequired, StatusCode::UNAUTHORIZED, PublicErrorType::AuthorizationRequired; "missing auth")]
    #[test_case(Error::InvalidToken, StatusCode::UNAUTHORIZED, PublicErrorType::InvalidToken; "bad token")]
    #[test_case(Error::Database(depot_registry_db::Error::NotFound("package `x`".into())), StatusCode::NOT_FOUND, PublicErrorType::NotFound; "not found")]
    #[test_case(Error::Search(depot_registry_client::Error::Closed), StatusCode::SERVICE_UNAVAILABLE, PublicErrorType::SearchUnavailable; "search closed")]
    #[test_case(Error::Database(depot_registry_db::Error::Internal("disk".into())), StatusCode::INTERNAL_SERVER_ERROR, PublicErrorType::InternalServerError; "internal")]
    fn errors_map_to_public_types(
        err: Error,
        status: StatusCode,
        public: PublicErrorType,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.to_error_response().error, public);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = Error::Database(depot_registry_db::Error::Internal("disk".into()));
        assert!(err.to_error_response().error_description.is_none());
    }
}
