//! Store round trips made by authenticated requests.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{get_auth, post_auth, register_token, test_config};
use talent_api::router::build_app_router;
use talent_api::state::AppState;
use talent_core::clock::ManualClock;
use talent_core::types::DbId;
use talent_db::models::user::{CreateUser, UpdateProfile, User};
use talent_db::{MemoryUserStore, StoreError, UserStore};

/// Memory store that counts lookups by id.
#[derive(Default)]
struct CountingStore {
    inner: MemoryUserStore,
    lookups: AtomicUsize,
}

#[async_trait]
impl UserStore for CountingStore {
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        self.inner.create(input).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, StoreError> {
        self.inner.update_profile(id, input).await
    }

    async fn record_login(&self, id: DbId) -> Result<Option<User>, StoreError> {
        self.inner.record_login(id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn authenticated_requests_load_the_user_once() {
    let config = test_config();
    let store = Arc::new(CountingStore::default());
    let state = AppState::new(
        config.clone(),
        store.clone(),
        Arc::new(ManualClock::starting_now()),
    )
    .unwrap();
    let app = build_app_router(state, &config);
    let token = register_token(app.clone(), "ada@example.com").await;

    for uri in ["/api/v1/auth/verify", "/api/v1/users/profile"] {
        store.lookups.store(0, Ordering::SeqCst);
        let response = get_auth(app.clone(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1, "{uri}");
    }

    store.lookups.store(0, Ordering::SeqCst);
    let response = post_auth(app.clone(), "/api/v1/auth/refresh", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
}
