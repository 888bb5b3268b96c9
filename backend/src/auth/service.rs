//! Authentication service
//!
//! Account registration, email/password sign-in and session bookkeeping.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthTokensResponse, Session, SignInRequest, SignUpRequest, User, UserRole};
use crate::repository::Repository;
use crate::store::{session_key, StoreError, USERS_KEY};

use super::jwt::{generate_access_token, verify_token, JwtError};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("User with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session not found or signed out")]
    SessionNotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Password error: {0}")]
    Password(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            other => AuthError::TokenError(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Password(e.to_string())
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        repo: Repository,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repo,
            jwt_secret,
            access_token_ttl_seconds,
            bcrypt_cost,
        }
    }

    /// Register a new account.
    ///
    /// The email scan and the append run in one transaction, so two sign-ups
    /// with the same email cannot both succeed.
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<User, AuthError> {
        let email = req.email.trim().to_string();
        let password_hash = self.hash(req.password).await?;

        let mut uow = self.repo.begin(&[USERS_KEY]).await?;
        let mut users = uow.users().await?;

        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: self.repo.next_id(),
            email,
            full_name: req.full_name.trim().to_string(),
            national_id: req.national_id.trim().to_string(),
            phone_number: String::new(),
            role: UserRole::Unset,
            password_hash,
            created_at: Utc::now(),
        };

        users.push(user.clone());
        uow.put_users(&users).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    /// Check credentials and open a session.
    ///
    /// The password is checked against a snapshot so bcrypt runs without
    /// holding any lock. The session copy is then taken under the users lock,
    /// which profile updates also hold, so it cannot miss a concurrent edit.
    pub async fn sign_in(&self, req: SignInRequest) -> Result<AuthTokensResponse, AuthError> {
        let email = req.email.trim();
        let candidate = self
            .repo
            .users()
            .await?
            .into_iter()
            .find(|u| u.email == email)
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify(req.password, candidate.password_hash.clone()).await? {
            tracing::debug!(user_id = %candidate.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let jti = Uuid::new_v4().to_string();
        let key = session_key(&jti);
        let mut uow = self.repo.begin(&[USERS_KEY, key.as_str()]).await?;

        let user = uow
            .users()
            .await?
            .into_iter()
            .find(|u| u.id == candidate.id && u.password_hash == candidate.password_hash)
            .ok_or(AuthError::InvalidCredentials)?;

        let access_token =
            generate_access_token(&user, &jti, &self.jwt_secret, self.access_token_ttl_seconds)?;

        let session = Session {
            jti,
            user: user.clone(),
            issued_at: Utc::now(),
        };

        uow.put_session(&session).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "user signed in");

        Ok(AuthTokensResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: user.into(),
        })
    }

    /// End a session; its token stops working immediately
    pub async fn sign_out(&self, jti: &str) -> Result<(), AuthError> {
        // Users lock first, so a profile update never rewrites a session
        // that is being removed
        let key = session_key(jti);
        let mut uow = self.repo.begin(&[USERS_KEY, key.as_str()]).await?;
        let session = uow.session(jti).await?.ok_or(AuthError::SessionNotFound)?;
        uow.remove_session(jti).await?;
        uow.commit().await?;

        tracing::info!(user_id = %session.user.id, "user signed out");
        Ok(())
    }

    /// Resolve a bearer token to its live session
    pub async fn verify_session(&self, token: &str) -> Result<Session, AuthError> {
        let claims = verify_token(token, &self.jwt_secret)?;

        let session = self
            .repo
            .session(&claims.jti)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user.id != claims.sub {
            return Err(AuthError::SessionNotFound);
        }

        Ok(session)
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Password(e.to_string()))?
            .map_err(AuthError::from)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Password(e.to_string()))?
            .map_err(AuthError::from)
    }
}
