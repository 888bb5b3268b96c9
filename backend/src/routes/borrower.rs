//! Borrower routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::borrower;
use crate::state::AppState;

pub fn borrower_routes() -> Router<AppState> {
    Router::new()
        .route("/borrower", get(borrower::dashboard))
        .route("/borrower/loans/:id/apply", post(borrower::apply_for_loan))
}
