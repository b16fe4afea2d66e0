//! Test registry context - an in-memory datastore in a scope, plus the app

use actix_web::{
    App,
    dev::ServiceResponse,
    http::Method,
    middleware::{Condition, from_fn},
    test, web,
};
use depot_registry::{CONFIG, RegistryConfig, configure, middleware::sanitize};
use depot_registry_client::{RegistryClient, SEARCH_CLIENT, SearchClient, Transport};
use depot_registry_db::{
    DATASTORE, Datastore, MemDatastore, NAME_TRACKER, NameTracker, entities::User, fixtures,
};
use depot_scope::Scope;
use futures::future::LocalBoxFuture;
use std::sync::Arc;

use super::RequestBuilder;

/// Test registry context providing a scoped datastore and app for integration tests
pub struct TestRegistryCtx {
    pub scope: Scope,
    pub db: Arc<MemDatastore>,
    pub names: Arc<NameTracker>,
    sanitize: bool,
}

impl TestRegistryCtx {
    pub fn new() -> Self {
        let db = Arc::new(MemDatastore::new());
        let names = Arc::new(NameTracker::new());
        let scope = Scope::root();

        scope.set(&CONFIG, Arc::new(RegistryConfig::fake()));
        scope.set(&DATASTORE, db.clone() as Arc<dyn Datastore>);
        scope.set(&NAME_TRACKER, names.clone());

        Self {
            scope,
            db,
            names,
            sanitize: true,
        }
    }

    /// Serve without the sanitizing middleware
    pub fn raw(mut self) -> Self {
        self.sanitize = false;
        self
    }

    /// Get database connection
    pub fn conn(&self) -> &dyn Datastore {
        self.db.as_ref()
    }

    /// Bind a search client whose every call is answered by `transport`
    pub fn with_search(
        self,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let client = RegistryClient::with_transport("http://search.test/", transport).unwrap();
        self.scope
            .set(&SEARCH_CLIENT, SearchClient::new(client));
        self
    }

    /// Build the actix-web test app with all routes configured
    pub async fn app(
        &self
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    > {
        test::init_service(
            App::new()
                .app_data(web::Data::new(self.scope.clone()))
                .wrap(Condition::new(self.sanitize, from_fn(sanitize)))
                .configure(configure),
        )
        .await
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

    // Helper methods for common test setups

    /// Create a user; its id doubles as its bearer token
    pub async fn create_user(&self) -> User {
        fixtures::user()
            .insert(self.conn())
            .await
            .unwrap()
    }

    /// Create a package with a single published version
    pub async fn create_package(
        &self,
        name: &str,
        version: &str,
    ) {
        let user = self.create_user().await;
        fixtures::package()
            .name(name)
            .uploader(&user.id)
            .latest(version)
            .insert(self.conn())
            .await
            .unwrap();
        fixtures::version(name)
            .version(version)
            .uploader(&user.id)
            .insert(self.conn())
            .await
            .unwrap();
        self.names.track(name);
    }
}

/// Answers every request with a fixed status and JSON body
pub struct StubTransport {
    pub status: u16,
    pub body: &'static str,
}

impl Transport for StubTransport {
    fn execute(
        &self,
        _: reqwest::Request,
    ) -> LocalBoxFuture<'_, depot_registry_client::Result<reqwest::Response>> {
        let response = http::Response::builder()
            .status(self.status)
            .header("content-type", "application/json")
            .body(self.body)
            .unwrap();

        Box::pin(async move { Ok(reqwest::Response::from(response)) })
    }
}
