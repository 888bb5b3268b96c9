//! Lender dashboard handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use super::LenderUser;
use crate::error::{ApiError, ApiResult};
use crate::loan::{CreateLoanRequest, LenderDashboard, LoanApplication, LoanView};
use crate::models::ApiResponse;
use crate::state::AppState;

/// GET /lender
pub async fn dashboard(
    State(state): State<AppState>,
    LenderUser(user): LenderUser,
) -> ApiResult<Json<ApiResponse<LenderDashboard>>> {
    let dashboard = state.loan_service.lender_dashboard(user.user()).await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

/// POST /lender/loans - Publish a loan offer
pub async fn create_loan(
    State(state): State<AppState>,
    LenderUser(user): LenderUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateLoanRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LoanView>>)> {
    let loan = state.loan_service.create_loan(user.user(), req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan.into()))))
}

/// POST /lender/applications/:id/approve
pub async fn approve_application(
    State(state): State<AppState>,
    LenderUser(user): LenderUser,
    Path(application_id): Path<String>,
) -> ApiResult<Json<ApiResponse<LoanApplication>>> {
    let application = state
        .loan_service
        .approve_application(user.user(), &application_id)
        .await?;
    Ok(Json(ApiResponse::ok(application)))
}

/// POST /lender/applications/:id/reject
pub async fn reject_application(
    State(state): State<AppState>,
    LenderUser(user): LenderUser,
    Path(application_id): Path<String>,
) -> ApiResult<Json<ApiResponse<LoanApplication>>> {
    let application = state
        .loan_service
        .reject_application(user.user(), &application_id)
        .await?;
    Ok(Json(ApiResponse::ok(application)))
}
