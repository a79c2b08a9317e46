pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register        register (public)
/// /auth/login           login (public)
/// /auth/verify          current user for the token (requires auth)
/// /auth/refresh         new token (requires auth)
/// /auth/logout          revoke the token (requires auth)
///
/// /users/profile        get, update own profile (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
}
