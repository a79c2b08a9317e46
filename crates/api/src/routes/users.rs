use axum::routing::get;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET /profile  -> get_profile (requires auth)
/// PUT /profile  -> update_profile (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(profile::get_profile).put(profile::update_profile),
    )
}
