//! The user-record store consumed by the authentication layer.
//!
//! [`UserStore`] is the only persistence surface the auth service sees.
//! [`PgUserStore`] backs it with PostgreSQL via [`UserRepo`];
//! [`MemoryUserStore`] keeps everything in process and is used for local
//! development without a database and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use talent_core::email::normalize_email;
use talent_core::types::DbId;
use tokio::sync::RwLock;

use crate::models::user::{CreateUser, UpdateProfile, User};
use crate::repositories::UserRepo;
use crate::DbPool;

/// Name of the case-insensitive unique index on `users.email`.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "uq_users_email";

/// PostgreSQL `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already holds this email (compared case-insensitively).
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION)
                && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
            {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(err)
    }
}

/// Persistence operations required by registration, login and the
/// authenticated profile endpoints.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] when the
    /// email is taken in any letter case.
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Apply the non-`None` fields of `input`. Returns `None` for an unknown id.
    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, StoreError>;

    /// Stamp `last_login_at` with the current time. Returns the updated
    /// user, or `None` for an unknown id.
    async fn record_login(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`UserStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::update_profile(&self.pool, id, input).await?)
    }

    async fn record_login(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::record_successful_login(&self.pool, id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    next_id: DbId,
    users: HashMap<DbId, User>,
}

/// [`UserStore`] holding users in process memory.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
#[derive(Default)]
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        let email_key = normalize_email(&input.email);
        if state
            .users
            .values()
            .any(|u| normalize_email(&u.email) == email_key)
        {
            return Err(StoreError::DuplicateEmail);
        }

        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            first_name: input.profile.first_name.clone(),
            last_name: input.profile.last_name.clone(),
            phone: input.profile.phone.clone(),
            location: input.profile.location.clone(),
            bio: input.profile.bio.clone(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let key = normalize_email(email);
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| normalize_email(&u.email) == key)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };

        let fields = [
            (&mut user.first_name, &input.first_name),
            (&mut user.last_name, &input.last_name),
            (&mut user.phone, &input.phone),
            (&mut user.location, &input.location),
            (&mut user.bio, &input.bio),
        ];
        for (current, update) in fields {
            if let Some(value) = update {
                *current = Some(value.clone());
            }
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn record_login(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.last_login_at = Some(Utc::now());
            user.clone()
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::models::user::ProfileFields;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            profile: ProfileFields {
                first_name: Some("Ada".into()),
                ..ProfileFields::default()
            },
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let a = store.create(&new_user("a@x.com")).await.unwrap();
        let b = store.create(&new_user("b@x.com")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_case_insensitive() {
        let store = MemoryUserStore::new();
        store.create(&new_user("A@X.com")).await.unwrap();

        let result = store.create(&new_user("a@x.com")).await;
        assert_matches!(result, Err(StoreError::DuplicateEmail));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() {
        let store = MemoryUserStore::new();
        let created = store.create(&new_user("a@x.com")).await.unwrap();

        let found = store.find_by_email("A@X.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_profile_applies_only_present_fields() {
        let store = MemoryUserStore::new();
        let created = store.create(&new_user("a@x.com")).await.unwrap();

        let update = UpdateProfile {
            bio: Some("Rustacean".into()),
            ..UpdateProfile::default()
        };
        let updated = store
            .update_profile(created.id, &update)
            .await
            .unwrap()
            .expect("user exists");

        assert_eq!(updated.bio.as_deref(), Some("Rustacean"));
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_profile_unknown_id_returns_none() {
        let store = MemoryUserStore::new();
        let result = store
            .update_profile(99, &UpdateProfile::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn record_login_sets_timestamp() {
        let store = MemoryUserStore::new();
        let created = store.create(&new_user("a@x.com")).await.unwrap();
        assert!(created.last_login_at.is_none());

        let stamped = store.record_login(created.id).await.unwrap().unwrap();
        assert!(stamped.last_login_at.is_some());
        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.last_login_at, stamped.last_login_at);

        assert!(store.record_login(999).await.unwrap().is_none());
    }

    #[test]
    fn debug_output_redacts_password_hash() {
        let user = User {
            id: 1,
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: None,
            last_name: None,
            phone: None,
            location: None,
            bio: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let rendered = format!("{user:?}");
        assert!(!rendered.contains("$argon2id$secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
