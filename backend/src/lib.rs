//! Bankiti Backend Library
//!
//! Peer-to-peer lending marketplace: accounts, loan offers, applications and
//! the decisions on them, persisted as JSON collections in a key-value store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod profile_service;
pub mod repository;
pub mod routes;
pub mod state;
pub mod store;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Build the full router with its middleware stack
pub fn build_app(state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .merge(routes::auth_routes())
        .merge(routes::lender_routes())
        .merge(routes::borrower_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(cors_allowed_origins))
}

/// CORS from a comma-separated origin list; permissive when none is given
pub fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default().trim();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
}
