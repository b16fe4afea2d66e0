//! Mock transport tests
//!
//! Requests issued through a [`RegistryClient`] backed by [`MockTransport`]
//! reach the handler pipeline in-process, each in its own child scope.

mod common;

use common::{Echo, MARKER, ScopeInfo, echo_handler};
use depot_harness::{
    MockTransport, Scope, ServicesOptions, TestResponse, registry_client, with_services,
};
use depot_registry_client::{RegistryClient, SharedToken};
use depot_registry_core::{PublicErrorType, models::PackageInfo};
use depot_registry_db::MemDatastore;
use std::sync::Arc;

const BASE_URL: &str = "http://bridge.test/";

fn echo_client(scope: &Scope) -> RegistryClient {
    MockTransport::new(scope.clone(), echo_handler())
        .into_client(BASE_URL)
        .unwrap()
}

#[actix_web::test]
async fn each_call_runs_in_a_fresh_child_scope() {
    let scope = Scope::root();
    let client = echo_client(&scope);

    let first: ScopeInfo = client
        .get("/scope")
        .json_response()
        .await
        .unwrap();
    let second: ScopeInfo = client
        .get("/scope")
        .json_response()
        .await
        .unwrap();

    assert_eq!(first.depth, scope.depth() + 1);
    assert_eq!(second.depth, scope.depth() + 1);
    assert_ne!(first.id, scope.id());
    assert_ne!(first.id, second.id);

    // the handler's binding stayed in its own request scope
    assert_eq!(second.inherited_marker, None);
    assert!(!scope.contains(&MARKER));
}

#[actix_web::test]
async fn caller_bindings_are_inherited() {
    let scope = Scope::root();
    scope.set(&MARKER, "caller".to_string());

    let info: ScopeInfo = echo_client(&scope)
        .get("/scope")
        .json_response()
        .await
        .unwrap();

    assert_eq!(info.inherited_marker.as_deref(), Some("caller"));
    assert_eq!(scope.get(&MARKER).as_deref(), Some("caller"));
}

#[actix_web::test]
async fn method_query_and_body_reach_the_handler() {
    let client = echo_client(&Scope::root());

    let echo: Echo = client
        .post("/echo")
        .body("payload")
        .json_response()
        .await
        .unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.body, "payload");

    let echo: Echo = client
        .get("/echo")
        .query("q", "neon")
        .query("limit", "5")
        .json_response()
        .await
        .unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query, "q=neon&limit=5");
    assert!(echo.body.is_empty());
}

#[actix_web::test]
async fn doubled_separators_are_collapsed() {
    let client = echo_client(&Scope::root());

    let echo: Echo = client
        .get("//nested/path")
        .json_response()
        .await
        .unwrap();

    assert_eq!(echo.path, "/nested/path");
}

#[actix_web::test]
async fn token_provider_is_consulted_per_request() {
    let token = SharedToken::new(Some("secret".into()));
    let client = MockTransport::new(Scope::root(), echo_handler())
        .with_token_provider(Arc::new(token.clone()))
        .into_client(BASE_URL)
        .unwrap();

    let echo: Echo = client
        .get("/echo")
        .bearer("ignored")
        .json_response()
        .await
        .unwrap();
    assert_eq!(echo.authorization.as_deref(), Some("secret"));

    token.set(Some("rotated".into()));
    let echo: Echo = client
        .get("/echo")
        .json_response()
        .await
        .unwrap();
    assert_eq!(echo.authorization.as_deref(), Some("rotated"));

    // no token leaves the request's own header alone
    token.set(None);
    let echo: Echo = client
        .get("/echo")
        .bearer("own")
        .json_response()
        .await
        .unwrap();
    assert_eq!(echo.authorization.as_deref(), Some("Bearer own"));
}

#[actix_web::test]
async fn unsanitized_errors_pass_through() {
    let resp = TestResponse::send(echo_client(&Scope::root()).get("/boom"))
        .await
        .unwrap()
        .assert_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(resp.body_string(), "db password is hunter2");
    assert!(resp.header("x-content-type-options").is_none());
}

#[actix_web::test]
async fn sanitized_errors_hide_internal_details() {
    let client = MockTransport::new(Scope::root(), echo_handler())
        .with_sanitizer()
        .into_client(BASE_URL)
        .unwrap();

    let resp = TestResponse::send(client.get("/boom"))
        .await
        .unwrap()
        .assert_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_type(PublicErrorType::InternalServerError);

    assert!(!resp.body_string().contains("hunter2"));
    assert!(resp.error_response().error_description.is_none());
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(resp.header("retry-after"), Some("30"));
    assert_eq!(resp.header("content-type"), Some("application/json"));

    let resp = TestResponse::send(client.get("/echo"))
        .await
        .unwrap()
        .assert_ok();
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
}

#[actix_web::test]
async fn frontend_routes_ignore_doubled_separators() {
    with_services(ServicesOptions::default(), |scope| {
        async move {
            let client = registry_client(&scope)?;

            let single: PackageInfo = client
                .get("/api/packages/neon")
                .json_response()
                .await?;
            let doubled: PackageInfo = client
                .get("//api/packages/neon")
                .json_response()
                .await?;

            assert_eq!(single, doubled);
            Ok(())
        }
    })
    .await
    .unwrap();
}

#[actix_web::test]
async fn reads_leave_the_datastore_untouched() {
    let db = Arc::new(MemDatastore::new());
    let options = ServicesOptions::builder()
        .datastore(db.clone())
        .build();

    with_services(options, {
        let db = db.clone();
        move |scope| {
            async move {
                let client = registry_client(&scope)?;
                let commits = db.commit_count();

                let first = TestResponse::send(client.get("/api/packages/oxygen"))
                    .await?
                    .assert_ok();
                let second = TestResponse::send(client.get("/api/packages/oxygen"))
                    .await?
                    .assert_ok();

                assert_eq!(first.body(), second.body());
                assert_eq!(db.commit_count(), commits);
                Ok(())
            }
        }
    })
    .await
    .unwrap();
}
