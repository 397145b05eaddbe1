//! Profile handlers
//!
//! Identity is owned by the external provider; these endpoints manage the
//! local profile keyed by the token subject.

use axum::{extract::State, Extension, Json};

use super::dto::{EnsureProfileRequest, UserResponse};
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = EnsureProfileRequest,
    responses(
        (status = 200, description = "The caller's profile, created on first use", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already used by another profile")
    )
)]
pub async fn ensure_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<EnsureProfileRequest>,
) -> ApiResult<UserResponse> {
    let profile = state
        .users
        .ensure_profile(&user.user_id, &user.email, &body.name, user.role)
        .await?;
    Ok(Json(ApiResponse::success(UserResponse {
        user: profile.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 404, description = "No profile yet")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserResponse> {
    let profile = state.users.get(&user.user_id).await?;
    Ok(Json(ApiResponse::success(UserResponse {
        user: profile.into(),
    })))
}
