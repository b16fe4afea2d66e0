use crate::{Error, ErrorOrResponseError, RequestBuilder, Result, Transport};
use depot_registry_core::{
    ErrorResponse,
    models::{PackageInfo, SearchQuery, SearchResults},
};
use reqwest::Method;
use std::sync::Arc;

/// HTTP client for the registry API, generic over its transport.
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn Transport>,
    base_url: url::Url,
}

impl RegistryClient {
    /// A client talking to `base_url` over the network.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_transport(base_url, Arc::new(reqwest::Client::new()))
    }

    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: url::Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// `path` on the client's host. The path is taken verbatim; callers
    /// add query parameters through [`RequestBuilder::query`].
    pub fn url(
        &self,
        path: &str,
    ) -> url::Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    pub fn get(
        &self,
        path: &str,
    ) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path)
    }

    pub fn post(
        &self,
        path: &str,
    ) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path)
    }

    pub fn put(
        &self,
        path: &str,
    ) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, path)
    }

    pub fn delete(
        &self,
        path: &str,
    ) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path)
    }

    /// Sends `req` and returns the raw response, whatever its status.
    pub async fn execute(
        &self,
        req: reqwest::Request,
    ) -> Result<reqwest::Response> {
        tracing::debug!(method = %req.method(), url = %req.url(), "sending request");
        self.transport.execute(req).await
    }

    /// Sends `req`, decoding a 2xx body as `T` and any other status as
    /// [`Error::Response`].
    pub async fn perform<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::Request,
    ) -> Result<T> {
        let resp = self.execute(req).await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            let parsed: T = serde_json::from_slice(&body)?;
            Ok(parsed)
        } else {
            Err(Self::handle_response_with_errors(status, body))
        }
    }

    fn handle_response_with_errors(
        status: reqwest::StatusCode,
        body: bytes::Bytes,
    ) -> Error {
        let error = if !body.is_empty() {
            match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(err_resp) => ErrorOrResponseError::ResponseError(err_resp),
                Err(parse_err) => {
                    tracing::trace! {
                        "Failed to parse error response: {}",
                        parse_err,
                    }
                    let error_str = String::from_utf8_lossy(&body);
                    ErrorOrResponseError::ErrorString(error_str.to_string())
                },
            }
        } else {
            ErrorOrResponseError::ErrorString("empty response body".to_string())
        };

        Error::Response { status, error }
    }

    pub async fn package(
        &self,
        name: &str,
    ) -> Result<PackageInfo> {
        self.get(&format!("/api/packages/{name}"))
            .json_response()
            .await
    }

    /// Frontend search, backed by the search service.
    pub async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResults> {
        self.get("/api/search")
            .search_query(query)
            .json_response()
            .await
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
