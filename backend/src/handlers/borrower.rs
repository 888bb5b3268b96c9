//! Borrower dashboard handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use super::BorrowerUser;
use crate::error::{ApiError, ApiResult};
use crate::loan::{ApplyRequest, BorrowerDashboard, LoanApplication};
use crate::models::ApiResponse;
use crate::state::AppState;

/// GET /borrower
pub async fn dashboard(
    State(state): State<AppState>,
    BorrowerUser(user): BorrowerUser,
) -> ApiResult<Json<ApiResponse<BorrowerDashboard>>> {
    let dashboard = state.loan_service.borrower_dashboard(user.user()).await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

/// POST /borrower/loans/:id/apply
pub async fn apply_for_loan(
    State(state): State<AppState>,
    BorrowerUser(user): BorrowerUser,
    Path(loan_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ApplyRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LoanApplication>>)> {
    let application = state
        .loan_service
        .apply_for_loan(user.user(), &loan_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(application))))
}
