use crate::Result;
use futures::future::LocalBoxFuture;

/// Executes one HTTP exchange.
///
/// The returned future is not required to be `Send`: in-process transports
/// drive handler services that are bound to the current thread.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> LocalBoxFuture<'_, Result<reqwest::Response>>;
}

impl Transport for reqwest::Client {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> LocalBoxFuture<'_, Result<reqwest::Response>> {
        Box::pin(async move { Ok(reqwest::Client::execute(self, request).await?) })
    }
}
