//! End-to-end service flows over the in-memory store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bankiti_server::config::Config;
    use bankiti_server::error::ApiError;
    use bankiti_server::loan::{ApplicationStatus, ApplyRequest, CreateLoanRequest};
    use bankiti_server::models::{
        SignInRequest, SignUpRequest, UpdateProfileRequest, User, UserRole,
    };
    use bankiti_server::state::AppState;
    use bankiti_server::store::{KeyValueStore, MemoryStore, APPLICATIONS_KEY, LOANS_KEY, USERS_KEY};

    fn setup() -> (AppState, MemoryStore) {
        let store = MemoryStore::new();
        let config = Config {
            bcrypt_cost: 4,
            ..Config::default()
        };
        (AppState::from_store(Arc::new(store.clone()), &config), store)
    }

    /// Sign up, sign in and pick a role; returns the refreshed user
    async fn register(state: &AppState, email: &str, name: &str, role: UserRole) -> User {
        state
            .auth_service
            .sign_up(SignUpRequest {
                email: email.to_string(),
                full_name: name.to_string(),
                national_id: "ID-1".to_string(),
                password: "password123".to_string(),
            })
            .await
            .expect("sign up");

        let tokens = state
            .auth_service
            .sign_in(SignInRequest {
                email: email.to_string(),
                password: "password123".to_string(),
            })
            .await
            .expect("sign in");
        let session = state
            .auth_service
            .verify_session(&tokens.access_token)
            .await
            .expect("session");

        state
            .profile_service
            .update(
                &session,
                UpdateProfileRequest {
                    phone_number: "+15550100".to_string(),
                    role,
                },
            )
            .await
            .expect("profile update")
    }

    fn loan_request(amount: f64, interest_rate: f64, duration: u32) -> CreateLoanRequest {
        CreateLoanRequest {
            amount,
            interest_rate,
            duration,
        }
    }

    fn purpose(text: &str) -> ApplyRequest {
        ApplyRequest {
            purpose: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lend_apply_approve() {
        let (state, _store) = setup();
        let loans = &state.loan_service;

        let lender = register(&state, "lena@example.com", "Lena Lender", UserRole::Lender).await;
        let borrower =
            register(&state, "bo@example.com", "Bo Borrower", UserRole::Borrower).await;

        let loan = loans
            .create_loan(&lender, loan_request(10000.0, 5.5, 12))
            .await
            .unwrap();

        let dashboard = loans.borrower_dashboard(&borrower).await.unwrap();
        assert_eq!(dashboard.available_loans.len(), 1);
        assert_eq!(dashboard.available_loans[0].total_repayment, 10550.0);
        assert_eq!(dashboard.available_loans[0].already_applied, Some(false));

        let application = loans
            .apply_for_loan(&borrower, &loan.id, purpose("New roof"))
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.borrower_name, "Bo Borrower");
        assert_eq!(application.borrower_email, "bo@example.com");

        let dashboard = loans.borrower_dashboard(&borrower).await.unwrap();
        assert_eq!(dashboard.available_loans[0].already_applied, Some(true));
        assert_eq!(dashboard.stats.applications, 1);
        assert_eq!(dashboard.stats.pending, 1);

        let lender_view = loans.lender_dashboard(&lender).await.unwrap();
        assert_eq!(lender_view.stats.total_loans, 1);
        assert_eq!(lender_view.stats.total_amount, 10000.0);
        assert_eq!(lender_view.stats.applications, 1);
        assert_eq!(lender_view.stats.average_interest_rate, 5.5);
        assert!(lender_view.applications[0].actionable);

        let approved = loans
            .approve_application(&lender, &application.id)
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);

        let lender_view = loans.lender_dashboard(&lender).await.unwrap();
        assert!(!lender_view.applications[0].actionable);

        let dashboard = loans.borrower_dashboard(&borrower).await.unwrap();
        assert_eq!(dashboard.stats.pending, 0);
        assert_eq!(dashboard.stats.approved, 1);
    }

    #[tokio::test]
    async fn test_decided_applications_are_final() {
        let (state, _store) = setup();
        let loans = &state.loan_service;

        let lender = register(&state, "l@example.com", "L", UserRole::Lender).await;
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        let loan = loans
            .create_loan(&lender, loan_request(500.0, 3.0, 6))
            .await
            .unwrap();
        let application = loans
            .apply_for_loan(&borrower, &loan.id, purpose("Books"))
            .await
            .unwrap();

        loans
            .reject_application(&lender, &application.id)
            .await
            .unwrap();

        let err = loans
            .approve_application(&lender, &application.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = loans
            .reject_application(&lender, &application.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_decide_checks_ownership_and_existence() {
        let (state, _store) = setup();
        let loans = &state.loan_service;

        let owner = register(&state, "owner@example.com", "Owner", UserRole::Lender).await;
        let other = register(&state, "other@example.com", "Other", UserRole::Lender).await;
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        let loan = loans
            .create_loan(&owner, loan_request(800.0, 2.0, 3))
            .await
            .unwrap();
        let application = loans
            .apply_for_loan(&borrower, &loan.id, purpose("Bike"))
            .await
            .unwrap();

        let err = loans
            .approve_application(&other, &application.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = loans
            .approve_application(&owner, "no-such-application")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // The other lender sees nothing on their dashboard
        let other_view = loans.lender_dashboard(&other).await.unwrap();
        assert!(other_view.loans.is_empty());
        assert!(other_view.applications.is_empty());
        assert_eq!(other_view.stats.average_interest_rate, 0.0);
    }

    #[tokio::test]
    async fn test_duplicate_application_writes_nothing() {
        let (state, store) = setup();
        let loans = &state.loan_service;

        let lender = register(&state, "l@example.com", "L", UserRole::Lender).await;
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        let loan = loans
            .create_loan(&lender, loan_request(1000.0, 4.0, 12))
            .await
            .unwrap();
        loans
            .apply_for_loan(&borrower, &loan.id, purpose("Car"))
            .await
            .unwrap();
        let before = store.raw(APPLICATIONS_KEY).await;

        let err = loans
            .apply_for_loan(&borrower, &loan.id, purpose("Car again"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.raw(APPLICATIONS_KEY).await, before);
    }

    #[tokio::test]
    async fn test_invalid_loan_and_application_input() {
        let (state, store) = setup();
        let loans = &state.loan_service;

        let lender = register(&state, "l@example.com", "L", UserRole::Lender).await;
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        for request in [
            loan_request(0.0, 5.0, 12),
            loan_request(-10.0, 5.0, 12),
            loan_request(1000.0, -1.0, 12),
            loan_request(1000.0, 5.0, 0),
            loan_request(f64::NAN, 5.0, 12),
        ] {
            let err = loans.create_loan(&lender, request).await.unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)));
        }
        assert!(store.raw(LOANS_KEY).await.is_none());

        let loan = loans
            .create_loan(&lender, loan_request(1000.0, 0.0, 1))
            .await
            .unwrap();

        let err = loans
            .apply_for_loan(&borrower, &loan.id, purpose("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = loans
            .apply_for_loan(&borrower, "missing-loan", purpose("Rent"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_funded_loans_are_hidden_and_closed() {
        let (state, store) = setup();
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        store
            .insert_raw(
                LOANS_KEY,
                r#"[{"id":"1","lenderId":"9","amount":100,"interestRate":1,"duration":2,
                     "createdAt":"2025-01-01T00:00:00Z","status":"funded"}]"#,
            )
            .await;

        let dashboard = state.loan_service.borrower_dashboard(&borrower).await.unwrap();
        assert!(dashboard.available_loans.is_empty());

        let err = state
            .loan_service
            .apply_for_loan(&borrower, "1", purpose("Late"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_dangling_applications_are_skipped() {
        let (state, store) = setup();
        let borrower = register(&state, "b@example.com", "B", UserRole::Borrower).await;

        let raw = format!(
            r#"[{{"id":"5","loanId":"gone","borrowerId":"{}","borrowerName":"B",
                 "borrowerEmail":"b@example.com","purpose":"Trip",
                 "appliedAt":"2025-01-01T00:00:00Z","status":"pending"}}]"#,
            borrower.id
        );
        store.insert_raw(APPLICATIONS_KEY, raw).await;

        let dashboard = state.loan_service.borrower_dashboard(&borrower).await.unwrap();
        assert!(dashboard.applications.is_empty());
        assert_eq!(dashboard.stats.applications, 1);
        assert_eq!(dashboard.stats.pending, 1);
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_an_error() {
        let (state, store) = setup();
        store.insert_raw(USERS_KEY, "[{not json").await;

        let err: ApiError = state
            .auth_service
            .sign_up(SignUpRequest {
                email: "x@example.com".to_string(),
                full_name: "X".to_string(),
                national_id: "1".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), "STORE_ERROR");
        assert_eq!(store.raw(USERS_KEY).await.as_deref(), Some("[{not json"));
    }

    #[tokio::test]
    async fn test_concurrent_applications_are_not_lost() {
        let (state, store) = setup();
        let lender = register(&state, "l@example.com", "L", UserRole::Lender).await;
        let loan = state
            .loan_service
            .create_loan(&lender, loan_request(5000.0, 7.0, 24))
            .await
            .unwrap();

        let mut borrowers = Vec::new();
        for i in 0..8 {
            let email = format!("b{}@example.com", i);
            borrowers.push(register(&state, &email, "Borrower", UserRole::Borrower).await);
        }

        let mut handles = Vec::new();
        for borrower in borrowers {
            let loans = state.loan_service.clone();
            let loan_id = loan.id.clone();
            handles.push(tokio::spawn(async move {
                loans
                    .apply_for_loan(&borrower, &loan_id, purpose("Shop"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let applications = store.get(APPLICATIONS_KEY).await.unwrap().unwrap();
        assert_eq!(applications.as_array().unwrap().len(), 8);

        let lender_view = state.loan_service.lender_dashboard(&lender).await.unwrap();
        assert_eq!(lender_view.stats.applications, 8);
    }
}
