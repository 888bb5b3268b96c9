//! Authentication and profile DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{not_blank, UserResponse, UserRole};

/// Request body for account registration
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank")]
    pub national_id: String,
    #[validate(custom = "not_blank")]
    pub password: String,
}

/// Request body for sign-in
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub password: String,
}

/// Sign-up result; the client continues at `next`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user: UserResponse,
    pub next: String,
}

/// Session token issued at sign-in
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Profile form: phone number and role are the only editable fields
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: UserRole,
}
