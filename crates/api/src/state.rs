use std::sync::Arc;

use talent_core::clock::Clock;
use talent_db::UserStore;

use crate::auth::password::{CredentialError, CredentialManager};
use crate::auth::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// User record store (PostgreSQL or in-memory).
    pub store: Arc<dyn UserStore>,
    /// Registration, login and token authentication.
    pub auth: Arc<AuthService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the auth service over `store` using the hashing and token
    /// settings in `config`.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CredentialError> {
        let credentials = CredentialManager::new(config.password)?;
        let auth = AuthService::new(Arc::clone(&store), credentials, &config.jwt, clock);

        Ok(Self {
            store,
            auth: Arc::new(auth),
            config: Arc::new(config),
        })
    }
}
