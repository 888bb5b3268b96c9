//! Loan models for Bankiti
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::not_blank;

/// Loan status enum
///
/// `Funded` is part of the stored format but no operation assigns it yet.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Available,
    Funded,
}

/// Loan offer published by a lender
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub lender_id: String,
    pub amount: f64,
    /// Percent, e.g. 5.5
    pub interest_rate: f64,
    /// Months
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn total_repayment(&self) -> f64 {
        total_repayment(self.amount, self.interest_rate)
    }
}

/// Simple interest over a single period: `amount * (1 + rate / 100)`
pub fn total_repayment(amount: f64, interest_rate: f64) -> f64 {
    amount + amount * interest_rate / 100.0
}

/// Application lifecycle. `Approved` and `Rejected` are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ApplicationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Lender's verdict on a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// Borrower's application against a loan. Name and email are copied from the
/// borrower at apply time and never re-synced.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: String,
    pub loan_id: String,
    pub borrower_id: String,
    pub borrower_name: String,
    pub borrower_email: String,
    pub purpose: String,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

/// Request to create a new loan
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub amount: f64,
    #[validate(range(min = 0.0, message = "interest rate cannot be negative"))]
    pub interest_rate: f64,
    #[validate(range(min = 1, message = "duration must be at least one month"))]
    pub duration: u32,
}

/// Request to apply for a loan
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(custom = "not_blank")]
    pub purpose: String,
}

/// Loan as shown on a dashboard
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub total_repayment: f64,
    /// Only set on the borrower dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_applied: Option<bool>,
}

impl From<Loan> for LoanView {
    fn from(loan: Loan) -> Self {
        Self {
            total_repayment: loan.total_repayment(),
            loan,
            already_applied: None,
        }
    }
}

/// Application joined with the loan it targets
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: LoanApplication,
    pub loan: LoanView,
    /// Whether approve/reject may be offered
    pub actionable: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LenderStats {
    pub total_loans: usize,
    pub total_amount: f64,
    pub applications: usize,
    pub average_interest_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LenderDashboard {
    pub loans: Vec<LoanView>,
    pub applications: Vec<ApplicationView>,
    pub stats: LenderStats,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerStats {
    pub available_loans: usize,
    pub applications: usize,
    pub pending: usize,
    pub approved: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerDashboard {
    pub available_loans: Vec<LoanView>,
    pub applications: Vec<ApplicationView>,
    pub stats: BorrowerStats,
}
