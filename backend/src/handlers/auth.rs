//! Authentication HTTP handlers
//!
//! Sign up, sign in and sign out.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, AuthTokensResponse, SignInRequest, SignUpRequest, SignUpResponse};
use crate::navigation::Route;
use crate::state::AppState;

/// Sign-out result; the client continues at `next`
#[derive(Debug, Serialize, Deserialize)]
pub struct SignOutResponse {
    pub next: String,
}

/// POST /signup - Register a new account
pub async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignUpRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignUpResponse>>)> {
    req.validate()?;

    let user = state.auth_service.sign_up(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SignUpResponse {
            user: user.into(),
            next: Route::SignIn.path().to_string(),
        })),
    ))
}

/// POST /signin - Exchange email and password for a session token
pub async fn sign_in(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignInRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    req.validate()?;

    let tokens = state.auth_service.sign_in(req).await?;

    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /signout - End the current session
pub async fn sign_out(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<SignOutResponse>>> {
    state.auth_service.sign_out(user.jti()).await?;

    Ok(Json(ApiResponse::ok(SignOutResponse {
        next: Route::SignIn.path().to_string(),
    })))
}
