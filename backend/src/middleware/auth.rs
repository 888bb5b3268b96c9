//! Authentication middleware
//!
//! Extractors that resolve the bearer token to a live session and apply the
//! navigation rules for role pages.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{Session, User};
use crate::navigation::{check_access, Access, Route};

/// Signed-in user, resolved from the session the token points at
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub session: Session,
}

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.session.user
    }

    pub fn jti(&self) -> &str {
        &self.session.jti
    }

    /// Apply the page rules for `route` to this user
    fn require(self, route: Route) -> Result<Self, ApiError> {
        match check_access(route, Some(self.user())) {
            Access::Allow => Ok(self),
            Access::Redirect(Route::SignIn) => {
                Err(ApiError::Unauthorized("Sign in required".to_string()))
            }
            Access::Redirect(_) => Err(ApiError::WrongRole(format!(
                "{} requires the {} role",
                route.path(),
                route.required_role().map(|r| r.as_str()).unwrap_or_default()
            ))),
        }
    }
}

/// Extractor for authenticated users
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.user().full_name)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let session = auth_service.verify_session(bearer.token()).await?;

        Ok(AuthenticatedUser { session })
    }
}

/// Signed-in user holding the lender role
#[derive(Debug, Clone)]
pub struct LenderUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for LenderUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(LenderUser(user.require(Route::Lender)?))
    }
}

/// Signed-in user holding the borrower role
#[derive(Debug, Clone)]
pub struct BorrowerUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for BorrowerUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(BorrowerUser(user.require(Route::Borrower)?))
    }
}
