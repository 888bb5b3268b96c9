//! Profile HTTP handlers

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, UpdateProfileRequest, UserResponse};
use crate::state::AppState;

/// GET /profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(
        state.profile_service.get(&user.session).into(),
    ))
}

/// PUT /profile - Set phone number and role
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let updated = state.profile_service.update(&user.session, req).await?;

    Ok(Json(ApiResponse::ok(updated.into())))
}
