//! Profile-seeded runs of `with_profile`.

use depot_harness::{
    HarnessError, ProfileOptions, TestProfile, TestResponse, registry_client,
    registry_client_with_token, user_id, with_profile,
};
use depot_registry_client::StaticToken;
use depot_registry_core::models::{PackageInfo, PackageNames, ReportInfo, SessionInfo};
use std::sync::Arc;

const PROFILE: &str = r#"
packages:
  - name: retro
    versions: ["0.1.0", "0.2.0-beta"]
    uploaders: [dev@example.com]
  - name: legacy
    discontinued: true
default_user: dev@example.com
users:
  - email: dev@example.com
    likes: [retro]
"#;

fn bearer(email: &str) -> Arc<StaticToken> {
    Arc::new(StaticToken::new(format!("Bearer {}", user_id(email))))
}

#[actix_web::test]
async fn default_profile_is_served() {
    with_profile("default_profile_is_served", ProfileOptions::default(), |scope| {
        async move {
            let client = registry_client(&scope)?;

            let neon: PackageInfo = client.package("neon").await?;
            assert_eq!(neon.latest.version, "2.0.0");
            assert_eq!(neon.likes, 2);
            assert_eq!(neon.publisher_id.as_deref(), Some("example.com"));

            let report: ReportInfo = client
                .get("/api/packages/neon/report")
                .json_response()
                .await?;
            assert_eq!(report.version, "2.0.0");
            assert!(report.tags.contains(&"is:auto-generated".to_string()));

            let names: PackageNames = client
                .get("/api/package-names")
                .json_response()
                .await?;
            assert_eq!(names.packages, vec!["flutter_titanium", "neon", "oxygen"]);

            let results = client
                .search(&depot_registry_core::models::SearchQuery::text("oxygen"))
                .await?;
            assert_eq!(results.names(), vec!["oxygen"]);

            Ok(())
        }
    })
    .await
    .unwrap();
}

#[actix_web::test]
async fn profile_users_can_authenticate() {
    with_profile("profile_users_can_authenticate", ProfileOptions::default(), |scope| {
        async move {
            let admin: SessionInfo = registry_client_with_token(&scope, bearer("admin@example.com"))?
                .get("/api/account/session")
                .json_response()
                .await?;
            assert_eq!(admin.user_id, user_id("admin@example.com"));
            assert!(admin.is_admin);

            let user: SessionInfo = registry_client_with_token(&scope, bearer("user@example.com"))?
                .get("/api/account/session")
                .json_response()
                .await?;
            assert_eq!(user.email, "user@example.com");
            assert!(!user.is_admin);

            TestResponse::send(registry_client(&scope)?.get("/api/account/session"))
                .await?
                .assert_authorization_required();

            Ok(())
        }
    })
    .await
    .unwrap();
}

#[actix_web::test]
async fn custom_profile_replaces_the_default() {
    let options = ProfileOptions::builder()
        .test_profile(TestProfile::from_yaml(PROFILE).unwrap())
        .build();

    with_profile("custom_profile_replaces_the_default", options, |scope| {
        async move {
            let client = registry_client(&scope)?;

            let retro: PackageInfo = client.package("retro").await?;
            assert_eq!(retro.latest.version, "0.1.0");
            assert_eq!(retro.versions.len(), 2);
            assert_eq!(retro.likes, 1);

            let legacy: PackageInfo = client.package("legacy").await?;
            assert!(legacy.is_discontinued);
            assert_eq!(legacy.latest.version, "1.0.0");
            assert_eq!(legacy.latest.uploader, Some(user_id("dev@example.com")));

            TestResponse::send(client.get("/api/packages/neon"))
                .await?
                .assert_not_found();

            Ok(())
        }
    })
    .await
    .unwrap();
}

#[actix_web::test]
async fn invalid_profile_fails_setup() {
    let profile = TestProfile::builder()
        .packages(vec![
            depot_harness::profile::ProfilePackage::builder()
                .name("orphan")
                .build(),
        ])
        .build();
    let options = ProfileOptions::builder()
        .test_profile(profile)
        .build();

    let err = with_profile("invalid_profile_fails_setup", options, |_| async move { Ok(()) })
        .await
        .unwrap_err();

    assert!(err.is_setup(), "{err}");
}

#[actix_web::test]
async fn body_failures_stay_body_failures() {
    let err = with_profile("body_failures_stay_body_failures", ProfileOptions::default(), |_| {
        async move { Err("retro is missing".into()) }
    })
    .await
    .unwrap_err();

    assert!(err.is_body());
    assert!(err.secondary().is_empty());
    assert_eq!(err.to_string(), "retro is missing");
}

#[actix_web::test]
async fn profile_runs_honor_the_timeout() {
    let options = ProfileOptions::builder()
        .timeout(std::time::Duration::from_millis(20))
        .build();

    let err = with_profile("profile_runs_honor_the_timeout", options, |_| {
        async move {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(())
        }
    })
    .await
    .unwrap_err();

    assert!(matches!(err, HarnessError::Timeout(_)));
}
