//! Fluent request builder for registry HTTP requests

use crate::{Error, RegistryClient, Result};
use depot_registry_core::models::SearchQuery;
use reqwest::{
    Method,
    header::{HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

/// Fluent builder for one request against a [`RegistryClient`].
pub struct RequestBuilder<'c> {
    client: &'c RegistryClient,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    query_params: Vec<(String, String)>,
    error: Option<Error>,
}

impl<'c> RequestBuilder<'c> {
    pub(crate) fn new(
        client: &'c RegistryClient,
        method: Method,
        path: &str,
    ) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            headers: vec![],
            body: None,
            query_params: vec![],
            error: None,
        }
    }

    /// Set Bearer token authorization header
    pub fn bearer(
        self,
        token: &str,
    ) -> Self {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    /// Set JSON body and Content-Type header
    pub fn json<T: Serialize>(
        mut self,
        body: &T,
    ) -> Self {
        match serde_json::to_vec(body) {
            Ok(body) => self.body = Some(body),
            Err(err) => self.error = Some(err.into()),
        }
        self.header("Content-Type", "application/json")
    }

    /// Set raw string body
    pub fn body(
        mut self,
        body: &str,
    ) -> Self {
        self.body = Some(body.as_bytes().to_vec());
        self
    }

    /// Add a query parameter
    pub fn query(
        mut self,
        key: &str,
        value: &str,
    ) -> Self {
        self.query_params
            .push((key.to_string(), value.to_string()));
        self
    }

    /// Add the set fields of a [`SearchQuery`] as query parameters
    pub fn search_query(
        mut self,
        query: &SearchQuery,
    ) -> Self {
        if let Some(q) = &query.q {
            self = self.query("q", q);
        }
        if let Some(offset) = query.offset {
            self = self.query("offset", &offset.to_string());
        }
        if let Some(limit) = query.limit {
            self = self.query("limit", &limit.to_string());
        }
        self
    }

    /// Add a custom header
    pub fn header(
        mut self,
        key: &str,
        value: &str,
    ) -> Self {
        self.headers
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<reqwest::Request> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut url = self.client.url(&self.path);
        if !self.query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(&self.query_params);
        }

        let mut request = reqwest::Request::new(self.method, url);

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::InvalidHeader { name: key.clone() })?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidHeader { name: key.clone() })?;
            request.headers_mut().append(name, value);
        }

        if let Some(body) = self.body {
            *request.body_mut() = Some(reqwest::Body::from(body));
        }

        Ok(request)
    }

    /// Send the request and return the raw response
    pub async fn send(self) -> Result<reqwest::Response> {
        let client = self.client;
        client.execute(self.build()?).await
    }

    /// Send the request and decode a successful JSON body
    pub async fn json_response<T: DeserializeOwned>(self) -> Result<T> {
        let client = self.client;
        client.perform(self.build()?).await
    }
}
