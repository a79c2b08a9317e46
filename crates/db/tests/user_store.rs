//! PostgreSQL-backed store tests.
//!
//! These need a reachable database (`DATABASE_URL`), so they are ignored by
//! default. Run with `cargo test -p talent-db -- --ignored`.

use assert_matches::assert_matches;
use sqlx::PgPool;
use talent_db::models::user::{CreateUser, ProfileFields, UpdateProfile};
use talent_db::{PgUserStore, StoreError, UserStore};

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
        profile: ProfileFields {
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            ..ProfileFields::default()
        },
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_and_find_user(pool: PgPool) {
    let store = PgUserStore::new(pool);
    let created = store.create(&new_user("grace@x.com")).await.unwrap();

    let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "grace@x.com");
    assert_eq!(by_id.first_name.as_deref(), Some("Grace"));

    let by_email = store.find_by_email("GRACE@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_maps_to_store_error(pool: PgPool) {
    let store = PgUserStore::new(pool);
    store.create(&new_user("A@X.com")).await.unwrap();

    let result = store.create(&new_user("a@x.com")).await;
    assert_matches!(result, Err(StoreError::DuplicateEmail));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_profile_and_record_login(pool: PgPool) {
    let store = PgUserStore::new(pool);
    let created = store.create(&new_user("ada@x.com")).await.unwrap();

    let update = UpdateProfile {
        location: Some("London".into()),
        ..UpdateProfile::default()
    };
    let updated = store
        .update_profile(created.id, &update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.location.as_deref(), Some("London"));
    assert_eq!(updated.last_name.as_deref(), Some("Hopper"));

    let stamped = store.record_login(created.id).await.unwrap().unwrap();
    assert!(stamped.last_login_at.is_some());

    assert!(store.health_check().await.is_ok());
}
