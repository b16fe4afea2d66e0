mod common;

use common::{TestDbCtx, fixtures, *};

#[tokio::test]
async fn fixtures_generate_unique_users() {
    let ctx = TestDbCtx::new();

    let a = fixtures::user()
        .insert(ctx.conn())
        .await
        .unwrap();
    let b = fixtures::user()
        .insert(ctx.conn())
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_ne!(a.email, b.email);
    assert_eq!(ctx.db.len().await, 2);
}

#[tokio::test]
async fn lookup_by_id_and_email() {
    let ctx = TestDbCtx::new();

    let user = fixtures::user()
        .id("u-admin")
        .email("admin@example.com")
        .insert(ctx.conn())
        .await
        .unwrap();

    assert_eq!(User::by_id(ctx.conn(), "u-admin").await.unwrap(), user);
    assert_eq!(
        User::by_email(ctx.conn(), "admin@example.com")
            .await
            .unwrap(),
        Some(user)
    );
    assert!(
        User::by_email(ctx.conn(), "nobody@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let ctx = TestDbCtx::new();

    let err = fixtures::user()
        .email("not-an-email")
        .insert(ctx.conn())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(ctx.db.is_empty().await);
}

#[test]
fn entities_serialize_with_kind_tag() {
    let entity: Entity = fixtures::publisher()
        .id("example.com")
        .member("u1")
        .build()
        .into();

    let json = serde_json::to_value(&entity).unwrap();

    assert_eq!(json["kind"], "publisher");
    assert_eq!(json["entity"]["id"], "example.com");
    assert_eq!(json["entity"]["contact_email"], "admin@example.com");
}
