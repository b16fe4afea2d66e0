//! Fluent assertions over bridged responses

use bytes::Bytes;
use depot_registry_client::{RequestBuilder, Result};
use depot_registry_core::{ErrorResponse, PublicErrorType};
use reqwest::{StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;

/// A fully read response with fluent assertions.
///
/// Assertions panic with the response body in the message, like the
/// standard `assert!` family.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads `resp` to the end.
    pub async fn read(resp: reqwest::Response) -> Result<Self> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Sends `request`, keeping the response whatever its status.
    pub async fn send(request: RequestBuilder<'_>) -> Result<Self> {
        Self::read(request.send().await?).await
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Assert status equals expected, returns self for chaining
    pub fn assert_status(
        self,
        expected: StatusCode,
    ) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {expected}, got {}. Body: {}",
            self.status,
            self.body_string()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    /// Parse body as JSON, panics if parsing fails
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Failed to parse response body as JSON: {}. Body: {}",
                e,
                self.body_string()
            )
        })
    }

    pub fn error_response(&self) -> ErrorResponse {
        self.json()
    }

    /// Assert error type matches expected
    pub fn assert_error_type(
        self,
        expected: PublicErrorType,
    ) -> Self {
        let err = self.error_response();
        assert_eq!(
            err.error, expected,
            "Expected error type {expected}, got {}",
            err.error
        );
        self
    }

    pub fn assert_authorization_required(self) -> Self {
        self.assert_unauthorized()
            .assert_error_type(PublicErrorType::AuthorizationRequired)
    }

    pub fn assert_invalid_token_error(self) -> Self {
        self.assert_unauthorized()
            .assert_error_type(PublicErrorType::InvalidToken)
    }
}

impl std::fmt::Debug for TestResponse {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("body", &self.body_string())
            .finish()
    }
}
