//! Loan service layer - Business logic for the lending marketplace
//!
//! Dashboards are computed from whole-collection reads. Every mutation runs
//! inside one unit of work so concurrent requests cannot lose each other's
//! writes.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::loan::{
    ApplicationStatus, ApplicationView, ApplyRequest, BorrowerDashboard, BorrowerStats,
    CreateLoanRequest, Decision, LenderDashboard, LenderStats, Loan, LoanApplication, LoanStatus,
    LoanView,
};
use crate::models::User;
use crate::repository::Repository;
use crate::store::{APPLICATIONS_KEY, LOANS_KEY};

/// Loan service for managing offers and applications
#[derive(Clone)]
pub struct LoanService {
    repo: Repository,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Lender's own loans, the applications against them, and summary stats
    pub async fn lender_dashboard(&self, lender: &User) -> ApiResult<LenderDashboard> {
        let my_loans: Vec<Loan> = self
            .repo
            .loans()
            .await?
            .into_iter()
            .filter(|loan| loan.lender_id == lender.id)
            .collect();
        let by_id: HashMap<&str, &Loan> =
            my_loans.iter().map(|loan| (loan.id.as_str(), loan)).collect();

        let applications: Vec<ApplicationView> = self
            .repo
            .applications()
            .await?
            .into_iter()
            .filter_map(|application| {
                let loan = by_id.get(application.loan_id.as_str())?;
                Some(ApplicationView {
                    actionable: application.status.is_pending(),
                    loan: LoanView::from((*loan).clone()),
                    application,
                })
            })
            .collect();

        let stats = lender_stats(&my_loans, applications.len());

        Ok(LenderDashboard {
            loans: my_loans.into_iter().map(LoanView::from).collect(),
            applications,
            stats,
        })
    }

    /// Publish a new loan offer
    pub async fn create_loan(&self, lender: &User, request: CreateLoanRequest) -> ApiResult<Loan> {
        request.validate()?;
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ApiError::ValidationError(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !request.interest_rate.is_finite() {
            return Err(ApiError::ValidationError(
                "interest rate must be a number".to_string(),
            ));
        }

        let loan = Loan {
            id: self.repo.next_id(),
            lender_id: lender.id.clone(),
            amount: request.amount,
            interest_rate: request.interest_rate,
            duration: request.duration,
            created_at: Utc::now(),
            status: LoanStatus::Available,
        };

        let mut uow = self.repo.begin(&[LOANS_KEY]).await?;
        let mut loans = uow.loans().await?;
        loans.push(loan.clone());
        uow.put_loans(&loans).await?;
        uow.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            lender_id = %loan.lender_id,
            amount = loan.amount,
            "loan created"
        );
        Ok(loan)
    }

    pub async fn approve_application(
        &self,
        lender: &User,
        application_id: &str,
    ) -> ApiResult<LoanApplication> {
        self.decide(lender, application_id, Decision::Approve).await
    }

    pub async fn reject_application(
        &self,
        lender: &User,
        application_id: &str,
    ) -> ApiResult<LoanApplication> {
        self.decide(lender, application_id, Decision::Reject).await
    }

    /// Move a pending application on one of the lender's loans to its final
    /// state
    pub async fn decide(
        &self,
        lender: &User,
        application_id: &str,
        decision: Decision,
    ) -> ApiResult<LoanApplication> {
        let mut uow = self.repo.begin(&[LOANS_KEY, APPLICATIONS_KEY]).await?;
        let loans = uow.loans().await?;
        let mut applications = uow.applications().await?;

        let application = applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

        let owns_loan = loans
            .iter()
            .any(|loan| loan.id == application.loan_id && loan.lender_id == lender.id);
        if !owns_loan {
            return Err(ApiError::Forbidden(
                "Application is not for one of your loans".to_string(),
            ));
        }

        if !application.status.is_pending() {
            return Err(ApiError::Conflict(format!(
                "Application is already {}",
                application.status.as_str()
            )));
        }

        application.status = decision.target_status();
        let decided = application.clone();

        uow.put_applications(&applications).await?;
        uow.commit().await?;

        tracing::info!(
            application_id = %decided.id,
            loan_id = %decided.loan_id,
            status = %decided.status.as_str(),
            "application {}",
            decided.status.as_str()
        );
        Ok(decided)
    }

    /// Open loans, the borrower's applications, and summary stats
    pub async fn borrower_dashboard(&self, borrower: &User) -> ApiResult<BorrowerDashboard> {
        let loans = self.repo.loans().await?;
        let mine: Vec<LoanApplication> = self
            .repo
            .applications()
            .await?
            .into_iter()
            .filter(|a| a.borrower_id == borrower.id)
            .collect();

        let applied: HashSet<&str> = mine.iter().map(|a| a.loan_id.as_str()).collect();
        let available_loans: Vec<LoanView> = loans
            .iter()
            .filter(|loan| loan.status == LoanStatus::Available)
            .map(|loan| LoanView {
                already_applied: Some(applied.contains(loan.id.as_str())),
                ..LoanView::from(loan.clone())
            })
            .collect();

        let stats = BorrowerStats {
            available_loans: available_loans.len(),
            applications: mine.len(),
            pending: count_status(&mine, ApplicationStatus::Pending),
            approved: count_status(&mine, ApplicationStatus::Approved),
        };

        let by_id: HashMap<&str, &Loan> =
            loans.iter().map(|loan| (loan.id.as_str(), loan)).collect();
        let applications = mine
            .into_iter()
            .filter_map(|application| match by_id.get(application.loan_id.as_str()) {
                Some(loan) => Some(ApplicationView {
                    loan: LoanView::from((*loan).clone()),
                    actionable: false,
                    application,
                }),
                None => {
                    tracing::debug!(
                        application_id = %application.id,
                        loan_id = %application.loan_id,
                        "skipping application for missing loan"
                    );
                    None
                }
            })
            .collect();

        Ok(BorrowerDashboard {
            available_loans,
            applications,
            stats,
        })
    }

    /// Submit a pending application for an available loan
    pub async fn apply_for_loan(
        &self,
        borrower: &User,
        loan_id: &str,
        request: ApplyRequest,
    ) -> ApiResult<LoanApplication> {
        request.validate()?;

        let mut uow = self.repo.begin(&[LOANS_KEY, APPLICATIONS_KEY]).await?;

        let loan = uow
            .loans()
            .await?
            .into_iter()
            .find(|loan| loan.id == loan_id)
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;
        if loan.status != LoanStatus::Available {
            return Err(ApiError::Conflict("Loan is no longer available".to_string()));
        }

        let mut applications = uow.applications().await?;
        if applications
            .iter()
            .any(|a| a.borrower_id == borrower.id && a.loan_id == loan.id)
        {
            return Err(ApiError::Conflict(
                "You have already applied for this loan".to_string(),
            ));
        }

        let application = LoanApplication {
            id: self.repo.next_id(),
            loan_id: loan.id,
            borrower_id: borrower.id.clone(),
            borrower_name: borrower.full_name.clone(),
            borrower_email: borrower.email.clone(),
            purpose: request.purpose.trim().to_string(),
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
        };

        applications.push(application.clone());
        uow.put_applications(&applications).await?;
        uow.commit().await?;

        tracing::info!(
            application_id = %application.id,
            loan_id = %application.loan_id,
            borrower_id = %application.borrower_id,
            "loan application submitted"
        );
        Ok(application)
    }
}

fn lender_stats(loans: &[Loan], applications: usize) -> LenderStats {
    let total_amount = loans.iter().map(|loan| loan.amount).sum();
    let average_interest_rate = if loans.is_empty() {
        0.0
    } else {
        loans.iter().map(|loan| loan.interest_rate).sum::<f64>() / loans.len() as f64
    };

    LenderStats {
        total_loans: loans.len(),
        total_amount,
        applications,
        average_interest_rate,
    }
}

fn count_status(applications: &[LoanApplication], status: ApplicationStatus) -> usize {
    applications.iter().filter(|a| a.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(id: &str, amount: f64, rate: f64) -> Loan {
        Loan {
            id: id.to_string(),
            lender_id: "L".to_string(),
            amount,
            interest_rate: rate,
            duration: 12,
            created_at: Utc::now(),
            status: LoanStatus::Available,
        }
    }

    #[test]
    fn test_lender_stats() {
        let stats = lender_stats(&[loan("1", 1000.0, 4.0), loan("2", 3000.0, 6.0)], 3);
        assert_eq!(stats.total_loans, 2);
        assert_eq!(stats.total_amount, 4000.0);
        assert_eq!(stats.applications, 3);
        assert_eq!(stats.average_interest_rate, 5.0);
    }

    #[test]
    fn test_lender_stats_without_loans() {
        assert_eq!(lender_stats(&[], 0), LenderStats::default());
    }
}
