//! An HTTP transport that calls the handler pipeline in-process.
//!
//! [`MockTransport`] implements [`Transport`], so the same
//! [`RegistryClient`] used against a deployed registry can drive the real
//! routes, middleware and error formatting without a socket. Every call is
//! served by a fresh actix app inside its own child [`Scope`].

use actix_service::IntoServiceFactory;
use actix_web::{
    App, HttpResponse,
    body::BoxBody,
    dev::{AppConfig, Service, ServiceFactory},
    http::{
        Method,
        header::{HeaderName, HeaderValue},
    },
    middleware::{Condition, from_fn},
    test, web,
};
use bytes::Bytes;
use depot_registry::middleware::sanitize;
use depot_registry_client::{Error, RegistryClient, Result, TokenProvider, Transport};
use depot_scope::{Scope, ScopeError};
use futures::future::LocalBoxFuture;
use std::sync::Arc;

/// Registers the routes served behind a bridge.
pub type Handler = Arc<dyn Fn(&mut web::ServiceConfig) + Send + Sync>;

/// One request as the handler pipeline receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgedRequest {
    pub method: String,
    /// Path and query, without leading separators
    pub url: String,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
    /// Mount point of the handler; bridges always target the root
    pub handler_path: String,
}

impl BridgedRequest {
    /// Converts a client request. A `token`, when given, replaces any
    /// `authorization` header the request already carries.
    pub fn from_request(
        request: &reqwest::Request,
        token: Option<String>,
    ) -> Result<Self> {
        let url = request.url();
        let path = url.path().trim_start_matches('/');
        let url = match url.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };

        let mut headers: Vec<(String, Vec<u8>)> = request
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();

        if let Some(token) = token {
            headers.retain(|(name, _)| name != "authorization");
            headers.push(("authorization".to_string(), token.into_bytes()));
        }

        let body = match request.body() {
            None => Bytes::new(),
            Some(body) => {
                let bytes = body
                    .as_bytes()
                    .ok_or_else(|| Error::Transport("streaming request bodies are not supported".into()))?;
                Bytes::copy_from_slice(bytes)
            },
        };

        Ok(Self {
            method: request.method().as_str().to_string(),
            url,
            headers,
            body,
            handler_path: String::new(),
        })
    }

    /// Request target as routed by the pipeline.
    pub fn uri(&self) -> String {
        format!("/{}{}", self.handler_path, self.url)
    }

    pub fn header(
        &self,
        name: &str,
    ) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_slice())
    }

    fn to_test_request(&self) -> Result<test::TestRequest> {
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| Error::Transport(format!("invalid method `{}`", self.method)))?;

        let mut req = test::TestRequest::default()
            .method(method)
            .uri(&self.uri());

        for (name, value) in &self.headers {
            let invalid = || Error::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_bytes(value).map_err(|_| invalid())?;
            req = req.append_header((header_name, header_value));
        }

        Ok(req.set_payload(self.body.clone()))
    }
}

/// In-process [`Transport`] over a [`Handler`].
pub struct MockTransport {
    scope: Scope,
    handler: Handler,
    sanitize: bool,
    token: Option<Arc<dyn TokenProvider>>,
}

impl MockTransport {
    /// Requests are served in children of `scope`.
    pub fn new(
        scope: Scope,
        handler: Handler,
    ) -> Self {
        Self {
            scope,
            handler,
            sanitize: false,
            token: None,
        }
    }

    /// Wraps the handler in the registry's sanitizing middleware.
    pub fn with_sanitizer(mut self) -> Self {
        self.sanitize = true;
        self
    }

    /// Attaches the provider's current token to every request.
    pub fn with_token_provider(
        mut self,
        provider: Arc<dyn TokenProvider>,
    ) -> Self {
        self.token = Some(provider);
        self
    }

    pub fn into_client(
        self,
        base_url: &str,
    ) -> Result<RegistryClient> {
        RegistryClient::with_transport(base_url, Arc::new(self))
    }
}

async fn dispatch(
    scope: Scope,
    handler: Handler,
    sanitized: bool,
    request: BridgedRequest,
) -> Result<reqwest::Response> {
    let app = App::new()
        .app_data(web::Data::new(scope))
        .wrap(Condition::new(sanitized, from_fn(sanitize)))
        .configure(|cfg| handler(cfg))
        .into_factory()
        .new_service(AppConfig::default())
        .await
    // the app factory's init error is `()`; actix logs the cause itself
    .map_err(|_| Error::Transport("handler pipeline failed to start".into()))?;

    let response: HttpResponse<BoxBody> = match app
        .call(request.to_test_request()?.to_request())
        .await
    {
        Ok(response) => {
            response
                .into_parts()
                .1
                .map_into_boxed_body()
        },
        Err(err) => err.error_response(),
    };

    let status = response.status();
    let headers: Vec<(String, Vec<u8>)> = response
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
        .collect();

    // no half-read bodies outlive the call
    let body = actix_web::body::to_bytes(response.into_body())
        .await
        .map_err(|err| Error::Transport(format!("failed to read response body: {err}")))?;

    tracing::debug!(
        method = %request.method,
        uri = %request.uri(),
        status = status.as_u16(),
        bytes = body.len(),
        "bridged request"
    );

    let mut builder = http::Response::builder().status(status.as_u16());
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_slice());
    }

    let response = builder
        .body(body)
        .map_err(|err| Error::Transport(err.to_string()))?;

    Ok(reqwest::Response::from(response))
}

impl Transport for MockTransport {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> LocalBoxFuture<'_, Result<reqwest::Response>> {
        Box::pin(async move {
            let token = self
                .token
                .as_ref()
                .and_then(|provider| provider.token());
            let bridged = BridgedRequest::from_request(&request, token)?;

            let handler = self.handler.clone();
            let sanitized = self.sanitize;

            let outcome = self
                .scope
                .enter(|scope| dispatch(scope, handler, sanitized, bridged))
                .await;

            match outcome {
                Ok(response) => Ok(response),
                Err(ScopeError::Body { error, teardown }) => {
                    if let Some(teardown) = teardown {
                        tracing::warn!("request scope teardown failed: {teardown}");
                    }
                    Err(error)
                },
                Err(ScopeError::Teardown(err)) => Err(Error::Transport(err.to_string())),
                Err(ScopeError::Closed(err)) => Err(Error::Transport(err.to_string())),
            }
        })
    }
}

/// A client for `base_url` whose requests are served by `handler` in
/// children of `scope`.
pub fn bridged_client(
    scope: &Scope,
    base_url: &str,
    handler: Handler,
) -> Result<RegistryClient> {
    MockTransport::new(scope.clone(), handler).into_client(base_url)
}
