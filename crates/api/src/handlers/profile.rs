//! Handlers for the authenticated user's own profile.

use axum::extract::State;
use axum::Json;
use talent_core::error::CoreError;
use talent_core::validation::{validate_input, UpdateProfileInput};
use talent_db::models::user::{UpdateProfile, UserResponse};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/profile
///
/// The record comes from the authentication lookup.
pub async fn get_profile(auth: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&auth.user),
    })
}

/// PUT /api/v1/users/profile
///
/// Update the supplied profile fields. Email and password are not editable
/// here.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let input = input.normalized();
    if input.is_empty() {
        return Err(CoreError::Validation(
            "At least one field must be provided for update".into(),
        )
        .into());
    }
    validate_input(&input)?;

    let update = UpdateProfile {
        first_name: input.first_name,
        last_name: input.last_name,
        phone: input.phone,
        location: input.location,
        bio: input.bio,
    };
    let user = state
        .store
        .update_profile(auth.user_id, &update)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}
