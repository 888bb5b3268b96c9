//! Landing, health, home and profile routes

use axum::{routing::get, Router};

use crate::handlers::{health, home, profile};
use crate::state::AppState;

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/health", get(health::health_check))
        .route("/home", get(home::home))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
}
