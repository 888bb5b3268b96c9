//! Lender routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::lender;
use crate::state::AppState;

pub fn lender_routes() -> Router<AppState> {
    Router::new()
        .route("/lender", get(lender::dashboard))
        .route("/lender/loans", post(lender::create_loan))
        .route(
            "/lender/applications/:id/approve",
            post(lender::approve_application),
        )
        .route(
            "/lender/applications/:id/reject",
            post(lender::reject_application),
        )
}
