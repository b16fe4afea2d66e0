//! Assertions over responses from the registry test app

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{StatusCode, header::HeaderMap},
    web::Bytes,
};
use depot_registry_core::{ErrorResponse, PublicErrorType};
use serde::de::DeserializeOwned;

/// A fully read response. Failed assertions panic with the body attached.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub(crate) async fn new<B: MessageBody>(resp: ServiceResponse<B>) -> Self {
        let resp = resp.into_parts().1;
        let status = resp.status();
        let headers = resp.headers().clone();

        let Ok(body) = actix_web::body::to_bytes(resp.into_body()).await else {
            panic!("response body for {status} could not be read");
        };

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    #[track_caller]
    pub fn assert_status(
        self,
        expected: StatusCode,
    ) -> Self {
        if self.status != expected {
            panic!("expected {expected}, got {}: {}", self.status, self.text());
        }
        self
    }

    #[track_caller]
    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    #[track_caller]
    pub fn assert_not_found(self) -> Self {
        self.assert_error(StatusCode::NOT_FOUND, PublicErrorType::NotFound)
    }

    #[track_caller]
    pub fn assert_authorization_required(self) -> Self {
        self.assert_error(StatusCode::UNAUTHORIZED, PublicErrorType::AuthorizationRequired)
    }

    #[track_caller]
    pub fn assert_invalid_token_error(self) -> Self {
        self.assert_error(StatusCode::UNAUTHORIZED, PublicErrorType::InvalidToken)
    }

    #[track_caller]
    fn assert_error(
        self,
        status: StatusCode,
        kind: PublicErrorType,
    ) -> Self {
        let this = self.assert_status(status);
        let actual = this.error_response().error;
        assert_eq!(actual, kind, "wrong error type: {}", this.text());
        this
    }

    #[track_caller]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(err) => panic!("body is not the expected JSON ({err}): {}", self.text()),
        }
    }

    #[track_caller]
    pub fn error_response(&self) -> ErrorResponse {
        self.json()
    }
}

impl std::fmt::Debug for TestResponse {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.text())
    }
}
