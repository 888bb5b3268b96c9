//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::loan_service::LoanService;
use crate::profile_service::ProfileService;
use crate::repository::Repository;
use crate::store::KeyValueStore;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub loan_service: Arc<LoanService>,
    pub store: Arc<dyn KeyValueStore>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        profile_service: Arc<ProfileService>,
        loan_service: Arc<LoanService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            auth_service,
            profile_service,
            loan_service,
            store,
        }
    }

    /// Wire every service over one store
    pub fn from_store(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let repo = Repository::new(store.clone());

        let auth_service = Arc::new(AuthService::new(
            repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_access_token_ttl_seconds,
            config.bcrypt_cost,
        ));

        Self::new(
            auth_service,
            Arc::new(ProfileService::new(repo.clone())),
            Arc::new(LoanService::new(repo)),
            store,
        )
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<ProfileService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.profile_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn KeyValueStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
