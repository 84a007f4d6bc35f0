//! tests/api/postgres_store.rs
//!
//! These need a running Postgres (see configuration/base.yaml):
//! $ cargo test -- --ignored

use crate::helpers::test_configuration;
use claims::{assert_matches, assert_none, assert_ok};
use sage_newsletter::domain::{LocaleSettings, Subscriber, SubscriberEmail};
use sage_newsletter::store::{PostgresStore, StoreError, SubscriberFilter, SubscriberStore};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

async fn configure_database() -> PgPool {
    let mut config = test_configuration();
    config.database.database_name = Uuid::new_v4().to_string();

    // Create database
    let mut connection = PgConnection::connect_with(&config.database.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(
            r#"CREATE DATABASE "{}";"#,
            config.database.database_name
        ))
        .await
        .expect("Failed to create database.");

    // Migrate database
    let db_pool = PgPool::connect_with(config.database.with_db())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to migrate the database");
    db_pool
}

fn subscriber(email: &str) -> Subscriber {
    let locales = LocaleSettings {
        default: "en".into(),
        supported: vec!["en".into()],
    };
    Subscriber::new(SubscriberEmail::parse(email.into()).unwrap(), &locales)
}

#[tokio::test]
#[ignore]
async fn inserted_subscribers_can_be_found_by_email() {
    let store = PostgresStore::new(configure_database().await);
    let new = subscriber("stored@example.com");

    assert_ok!(store.insert(&new).await);

    let found = store.find_by_email(&new.email).await.unwrap().unwrap();
    assert_eq!(found.id, new.id);
    assert_eq!(found.unsubscribe_token, new.unsubscribe_token);
    assert_eq!(found.preferences, new.preferences);
    assert!(found.is_active);
}

#[tokio::test]
#[ignore]
async fn a_missing_email_is_not_an_error() {
    let store = PostgresStore::new(configure_database().await);
    let email = SubscriberEmail::parse("nobody@example.com".into()).unwrap();

    assert_none!(store.find_by_email(&email).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn duplicate_keys_are_reported_as_such() {
    let store = PostgresStore::new(configure_database().await);
    let first = subscriber("unique@example.com");
    store.insert(&first).await.unwrap();

    let same_email = subscriber("unique@example.com");
    assert_matches!(
        store.insert(&same_email).await,
        Err(StoreError::DuplicateEmail)
    );

    let mut same_token = subscriber("other@example.com");
    same_token.unsubscribe_token = first.unsubscribe_token;
    assert_matches!(
        store.insert(&same_token).await,
        Err(StoreError::DuplicateToken)
    );
}

#[tokio::test]
#[ignore]
async fn bulk_updates_and_filters_work_against_postgres() {
    let store = PostgresStore::new(configure_database().await);
    let a = subscriber("a@example.com");
    let b = subscriber("b_%@example.com");
    store.insert(&a).await.unwrap();
    store.insert(&b).await.unwrap();

    assert_eq!(store.confirm_many(&[a.id]).await.unwrap(), 1);
    assert_eq!(store.deactivate_many(&[a.id, b.id]).await.unwrap(), 2);
    store.set_active(b.id, true).await.unwrap();

    let confirmed = store
        .list(&SubscriberFilter {
            confirmed: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, a.id);

    let active = store
        .list(&SubscriberFilter {
            is_active: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, b.id);

    // Wildcards in the search text match literally.
    let searched = store
        .list(&SubscriberFilter {
            q: Some("_%".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, b.id);
}

#[tokio::test]
#[ignore]
async fn updates_write_editable_columns_and_report_taken_emails() {
    let store = PostgresStore::new(configure_database().await);
    let owner = subscriber("owner@example.com");
    let mut mover = subscriber("mover@example.com");
    store.insert(&owner).await.unwrap();
    store.insert(&mover).await.unwrap();

    mover.gdpr_consent = true;
    mover.unsubscribe_token = Uuid::new_v4();
    assert_ok!(store.update(&mover).await);
    let stored = store.find_by_id(mover.id).await.unwrap().unwrap();
    assert!(stored.gdpr_consent);
    assert_ne!(stored.unsubscribe_token, mover.unsubscribe_token);

    mover.email = owner.email.clone();
    assert_matches!(store.update(&mover).await, Err(StoreError::DuplicateEmail));
}
