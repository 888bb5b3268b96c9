//! Profile service - reading and editing the signed-in user's details

use crate::error::{ApiError, ApiResult};
use crate::models::{Session, UpdateProfileRequest, User};
use crate::repository::Repository;
use crate::store::USERS_KEY;

#[derive(Clone)]
pub struct ProfileService {
    repo: Repository,
}

impl ProfileService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The profile as held by the session
    pub fn get(&self, session: &Session) -> User {
        session.user.clone()
    }

    /// Set phone number and role.
    ///
    /// The users collection and every session of the user are rewritten in
    /// the same transaction so they never disagree.
    pub async fn update(&self, session: &Session, req: UpdateProfileRequest) -> ApiResult<User> {
        let mut uow = self.repo.begin(&[USERS_KEY]).await?;

        let mut users = uow.users().await?;
        let user = users
            .iter_mut()
            .find(|u| u.id == session.user.id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        user.phone_number = req.phone_number.trim().to_string();
        user.role = req.role;
        let updated = user.clone();

        let sessions = uow.sessions_of(&updated.id).await?;
        if !sessions.iter().any(|s| s.jti == session.jti) {
            return Err(ApiError::Unauthorized("Session has ended".to_string()));
        }

        uow.put_users(&users).await?;
        for mut other in sessions {
            other.user = updated.clone();
            uow.put_session(&other).await?;
        }
        uow.commit().await?;

        tracing::info!(
            user_id = %updated.id,
            role = %updated.role.as_str(),
            "profile updated"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::models::{SignInRequest, SignUpRequest, UserRole};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn auth(repo: &Repository) -> AuthService {
        AuthService::new(repo.clone(), "secret".to_string(), 900, 4)
    }

    async fn sign_in(auth: &AuthService) -> (String, Session) {
        let tokens = auth
            .sign_in(SignInRequest {
                email: "grace@example.com".to_string(),
                password: "cobol".to_string(),
            })
            .await
            .unwrap();
        let session = auth.verify_session(&tokens.access_token).await.unwrap();
        (tokens.access_token, session)
    }

    async fn signed_in(repo: &Repository) -> Session {
        let auth = auth(repo);
        auth.sign_up(SignUpRequest {
            email: "grace@example.com".to_string(),
            full_name: "Grace Hopper".to_string(),
            national_id: "77".to_string(),
            password: "cobol".to_string(),
        })
        .await
        .unwrap();
        sign_in(&auth).await.1
    }

    #[tokio::test]
    async fn test_update_writes_users_and_session() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let session = signed_in(&repo).await;
        let profiles = ProfileService::new(repo.clone());

        let updated = profiles
            .update(
                &session,
                UpdateProfileRequest {
                    phone_number: "+15550100".to_string(),
                    role: UserRole::Lender,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Lender);

        let stored = repo.users().await.unwrap();
        assert_eq!(stored[0].phone_number, "+15550100");
        assert_eq!(stored[0].role, UserRole::Lender);

        let refreshed = repo.session(&session.jti).await.unwrap().unwrap();
        assert_eq!(refreshed.user, stored[0]);
    }

    #[tokio::test]
    async fn test_update_refreshes_every_session_of_the_user() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let first = signed_in(&repo).await;
        let auth = auth(&repo);
        let (second_token, second) = sign_in(&auth).await;
        assert_ne!(first.jti, second.jti);

        ProfileService::new(repo.clone())
            .update(
                &first,
                UpdateProfileRequest {
                    phone_number: "+15550100".to_string(),
                    role: UserRole::Borrower,
                },
            )
            .await
            .unwrap();

        let stored = repo.session(&second.jti).await.unwrap().unwrap();
        assert_eq!(stored.user.role, UserRole::Borrower);
        assert_eq!(stored.user.phone_number, "+15550100");

        let verified = auth.verify_session(&second_token).await.unwrap();
        assert_eq!(verified.user.role, UserRole::Borrower);
    }

    #[tokio::test]
    async fn test_update_after_sign_out_is_refused() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let session = signed_in(&repo).await;
        auth(&repo).sign_out(&session.jti).await.unwrap();

        let err = ProfileService::new(repo.clone())
            .update(&session, UpdateProfileRequest {
                phone_number: "1".to_string(),
                role: UserRole::Lender,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(repo.users().await.unwrap()[0].role, UserRole::Unset);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let mut session = signed_in(&repo).await;
        session.user.id = "does-not-exist".to_string();

        let err = ProfileService::new(repo)
            .update(&session, UpdateProfileRequest {
                phone_number: "1".to_string(),
                role: UserRole::Borrower,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
