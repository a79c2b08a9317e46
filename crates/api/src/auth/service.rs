//! Registration, login and token authentication over a [`UserStore`].
//!
//! ```text
//! register:     hash -> store.create -> issue
//! login:        store.find_by_email -> verify -> issue
//! authenticate: verify token -> denylist -> store.find_by_id -> user
//! ```
//!
//! Argon2 work runs on the blocking pool so a burst of logins does not stall
//! the async runtime.

use std::sync::Arc;

use talent_core::clock::Clock;
use talent_core::email::normalize_email;
use talent_db::models::user::{CreateUser, ProfileFields, User, UserResponse};
use talent_db::{StoreError, UserStore};

use super::denylist::TokenDenylist;
use super::jwt::{Claims, IssuedToken, JwtConfig, TokenService};
use super::password::{CredentialError, CredentialManager};
use super::AuthError;

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserResponse,
    pub token: IssuedToken,
}

/// A verified token together with the user it was issued to.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: Claims,
    pub user: User,
}

/// Composes the credential manager, the token service and the user store.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    credentials: Arc<CredentialManager>,
    tokens: TokenService,
    denylist: TokenDenylist,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        credentials: CredentialManager,
        jwt: &JwtConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            credentials: Arc::new(credentials),
            tokens: TokenService::new(jwt, Arc::clone(&clock)),
            denylist: TokenDenylist::new(clock),
        }
    }

    /// Create an account and sign the first token for it.
    ///
    /// The email is normalized before storage, so registrations differing only
    /// in letter case collide with [`AuthError::DuplicateEmail`].
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: ProfileFields,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::InvalidInput("Email must not be empty".into()));
        }

        let password_hash = self.hash_password(password).await?;

        let input = CreateUser {
            email,
            password_hash,
            profile,
        };
        let user = self.store.create(&input).await.map_err(|e| match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => store_failure(other),
        })?;

        let token = self.issue_for(&user)?;
        tracing::info!(user_id = user.id, "User registered");

        Ok(AuthSession {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Check an email/password pair and sign a token on success.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::InvalidCredentials`], after the same amount of hashing work.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_by_email(&email)
            .await
            .map_err(store_failure)?;

        let credentials = Arc::clone(&self.credentials);
        let password = password.to_string();
        let user = match user {
            Some(user) => {
                let stored = user.password_hash.clone();
                let verified =
                    run_blocking(move || credentials.verify(&password, &stored)).await?;
                verified.then_some(user)
            }
            None => {
                run_blocking(move || credentials.verify_dummy(&password)).await?;
                None
            }
        };

        let Some(user) = user else {
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let user = self
            .store
            .record_login(user.id)
            .await
            .map_err(store_failure)?
            .unwrap_or(user);

        let token = self.issue_for(&user)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(AuthSession {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Resolve a bearer token to its claims and the user they name.
    ///
    /// Fails with [`AuthError::Unauthenticated`] when the token does not
    /// verify, has been revoked, or names a user that no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Authenticated, AuthError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        if self.denylist.is_revoked(&claims.jti).await {
            tracing::debug!(user_id = claims.sub, "Revoked token presented");
            return Err(AuthError::Unauthenticated);
        }

        match self.store.find_by_id(claims.sub).await.map_err(store_failure)? {
            Some(user) => Ok(Authenticated { claims, user }),
            None => {
                tracing::debug!(user_id = claims.sub, "Token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Issue a new token for a user already resolved by [`Self::authenticate`].
    pub fn refresh(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.issue_for(user)
    }

    /// Revoke the token described by `claims` for the rest of its lifetime.
    pub async fn logout(&self, claims: &Claims) {
        self.denylist.revoke(&claims.jti, claims.exp).await;
        tracing::info!(user_id = claims.sub, "Token revoked");
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let credentials = Arc::clone(&self.credentials);
        let password = password.to_string();
        run_blocking(move || credentials.hash(&password))
            .await?
            .map_err(|e| match e {
                CredentialError::Empty | CredentialError::TooLong => {
                    AuthError::InvalidInput(e.to_string())
                }
                other => AuthError::Internal(other.to_string()),
            })
    }

    fn issue_for(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.tokens
            .issue(user.id, Some(&user.email))
            .map_err(|e| AuthError::Internal(format!("Token generation error: {e}")))
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("Credential task failed: {e}")))
}

fn store_failure(err: StoreError) -> AuthError {
    AuthError::Internal(format!("User store error: {err}"))
}
