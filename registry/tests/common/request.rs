//! Requests against the registry test app

use super::{TestRegistryCtx, TestResponse};
use actix_web::{
    dev::Service,
    http::{Method, header::AUTHORIZATION},
    test::TestRequest,
};

/// One request, assembled directly on an actix [`TestRequest`].
pub struct RequestBuilder<'ctx> {
    ctx: &'ctx TestRegistryCtx,
    path: String,
    query: Vec<String>,
    req: TestRequest,
}

impl<'ctx> RequestBuilder<'ctx> {
    pub(crate) fn new(
        ctx: &'ctx TestRegistryCtx,
        method: Method,
        path: &str,
    ) -> Self {
        Self {
            ctx,
            path: path.to_string(),
            query: vec![],
            req: TestRequest::default().method(method),
        }
    }

    /// Authenticates as the user whose id is `token`
    pub fn bearer(
        self,
        token: &str,
    ) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// Replaces any earlier value of `name`
    pub fn header(
        mut self,
        name: &str,
        value: &str,
    ) -> Self {
        self.req = self.req.insert_header((name, value));
        self
    }

    /// Values are sent as given, without encoding
    pub fn query(
        mut self,
        key: &str,
        value: &str,
    ) -> Self {
        self.query.push(format!("{key}={value}"));
        self
    }

    pub async fn send(self) -> TestResponse {
        let uri = if self.query.is_empty() {
            self.path
        } else {
            format!("{}?{}", self.path, self.query.join("&"))
        };

        let app = self.ctx.app().await;
        let resp = app
            .call(self.req.uri(&uri).to_request())
            .await
            .unwrap();

        TestResponse::new(resp).await
    }
}
