//! Data models for Bankiti backend
//!
//! Field names serialise in camelCase so the persisted collections keep the
//! layout the browser store used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

pub mod auth;
pub use auth::*;

/// User roles. A freshly registered user has no role until they pick one on
/// their profile; that state is stored as an empty string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Lender,
    Borrower,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Lender => "lender",
            UserRole::Borrower => "borrower",
            UserRole::Unset => "",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, UserRole::Unset)
    }
}

/// Registered user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: UserRole,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether phone number and role have both been filled in
    pub fn profile_complete(&self) -> bool {
        !self.phone_number.trim().is_empty() && self.role.is_set()
    }
}

/// Signed-in session: a snapshot of the user taken at sign-in and refreshed
/// on profile updates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub jti: String,
    pub user: User,
    pub issued_at: DateTime<Utc>,
}

/// Public view of a user, without the password hash
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    pub phone_number: String,
    pub role: UserRole,
    pub initials: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            initials: initials(&user.full_name),
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            national_id: user.national_id,
            phone_number: user.phone_number,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Up to two upper-cased initials from a full name
pub fn initials(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Presence check shared by request DTOs
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
