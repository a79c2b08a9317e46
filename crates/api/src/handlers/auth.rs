//! Handlers for the `/auth` resource (register, login, verify, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use talent_core::types::Timestamp;
use talent_core::validation::{validate_input, LoginInput, RegisterInput};
use talent_db::models::user::{ProfileFields, UserResponse};

use crate::auth::jwt::IssuedToken;
use crate::auth::AuthSession;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Scheme advertised in every token response.
const TOKEN_TYPE: &str = "Bearer";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A freshly signed token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub expires_at: Timestamp,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expires_in: issued.expires_in(),
            expires_at: issued.expires_at(),
            token: issued.token,
            token_type: TOKEN_TYPE,
        }
    }
}

/// Returned by register and login: the token plus the public user record.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.into(),
            user: session.user,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account and return its first token.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let input = input.normalized();
    validate_input(&input)?;

    let profile = ProfileFields {
        first_name: Some(input.first_name),
        last_name: Some(input.last_name),
        phone: input.phone,
        location: input.location,
        bio: input.bio,
    };
    let session = state
        .auth
        .register(&input.email, &input.password, profile)
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let input = input.normalized();
    validate_input(&input)?;

    let session = state.auth.login(&input.email, &input.password).await?;
    Ok(Json(session.into()))
}

/// GET /api/v1/auth/verify
///
/// Confirm the presented token and return the user it belongs to.
pub async fn verify(auth: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&auth.user),
    })
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid token for a new one with a full lifetime. The presented
/// token stays valid until it expires or is logged out.
pub async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<TokenResponse>> {
    let issued = state.auth.refresh(&auth.user)?;
    Ok(Json(issued.into()))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented token.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    state.auth.logout(&auth.claims).await;
    StatusCode::NO_CONTENT
}
