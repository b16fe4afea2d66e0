#![allow(clippy::result_large_err)]

use depot_registry_core::ErrorResponse;
use depot_scope::{Key, Scope};

mod client;
mod request;
mod search;
mod token;
mod transport;

pub use client::RegistryClient;
pub use request::RequestBuilder;
pub use search::SearchClient;
pub use token::{SharedToken, StaticToken, TokenProvider};
pub use transport::Transport;

/// Scope binding for the search-service client.
pub const SEARCH_CLIENT: Key<SearchClient> = Key::new("search-client");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid header `{name}`")]
    InvalidHeader { name: String },
    #[error("API Error {}: {error}", status.as_u16())]
    Response {
        status: reqwest::StatusCode,
        error: ErrorOrResponseError,
    },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Client is closed")]
    Closed,
    #[error("{0}")]
    Scope(#[from] depot_scope::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum ErrorOrResponseError {
    #[error("{0}")]
    ErrorString(String),
    #[error("{}", .0.error)]
    ResponseError(ErrorResponse),
}

impl Error {
    /// Status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Error::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured error body of a non-2xx response.
    pub fn error_response(&self) -> Option<&ErrorResponse> {
        match self {
            Error::Response {
                error: ErrorOrResponseError::ResponseError(response),
                ..
            } => Some(response),
            _ => None,
        }
    }
}

/// Resolves the search client bound in `scope`.
pub fn search_client(scope: &Scope) -> Result<SearchClient> {
    Ok(scope.require(&SEARCH_CLIENT)?)
}
