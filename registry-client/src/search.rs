use crate::{Error, RegistryClient, Result};
use depot_registry_core::models::{SearchQuery, SearchResults};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Typed client for the search service.
///
/// Clones share their open/closed state.
#[derive(Clone, Debug)]
pub struct SearchClient {
    client: RegistryClient,
    closed: Arc<AtomicBool>,
}

impl SearchClient {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    pub async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResults> {
        self.ensure_open()?;

        self.client
            .get("/search")
            .search_query(query)
            .json_response()
            .await
    }

    /// Whether the service answers its readiness probe with a 2xx.
    pub async fn is_ready(&self) -> Result<bool> {
        self.ensure_open()?;

        let resp = self.client.get("/ready").send().await?;
        Ok(resp.status().is_success())
    }

    /// Shuts the client down; later calls fail with [`Error::Closed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(url = %self.client.base_url(), "search client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
