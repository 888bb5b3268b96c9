//! Landing and Home pages

use axum::Json;
use serde::{Deserialize, Serialize};

use super::AuthenticatedUser;
use crate::models::{ApiResponse, UserResponse};
use crate::navigation::{home_destination, Route};

#[derive(Debug, Serialize, Deserialize)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingResponse {
    pub name: String,
    pub tagline: String,
    pub steps: Vec<Feature>,
    pub features: Vec<Feature>,
    pub sign_up: String,
    pub sign_in: String,
}

/// Account details plus where the user should go next
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    pub profile_incomplete: bool,
}

fn feature(title: &str, description: &str) -> Feature {
    Feature {
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Product overview and entry points
pub async fn landing() -> Json<ApiResponse<LandingResponse>> {
    Json(ApiResponse::ok(LandingResponse {
        name: "Bankiti".to_string(),
        tagline: "Peer-to-peer lending between verified lenders and borrowers".to_string(),
        steps: vec![
            feature(
                "Create Your Account",
                "Sign up with your email, full name, and national ID. Choose to be a lender or borrower.",
            ),
            feature(
                "Set Your Preferences",
                "Lenders set their terms and rates. Borrowers specify their loan requirements.",
            ),
            feature(
                "Start Transacting",
                "Get matched with the right counterparty and start lending or borrowing with confidence.",
            ),
        ],
        features: vec![
            feature(
                "Secure Platform",
                "Your data and transactions are protected with bank-level security and encryption.",
            ),
            feature(
                "Competitive Returns",
                "Lenders earn attractive interest rates while borrowers access flexible terms.",
            ),
            feature(
                "Trusted Community",
                "Join thousands of verified users in our growing lending and borrowing community.",
            ),
        ],
        sign_up: Route::SignUp.path().to_string(),
        sign_in: Route::SignIn.path().to_string(),
    }))
}

/// GET /home - Signed-in landing; points at the role dashboard when known
pub async fn home(user: AuthenticatedUser) -> Json<ApiResponse<HomeResponse>> {
    let current = user.session.user;

    Json(ApiResponse::ok(HomeResponse {
        redirect_to: home_destination(&current).map(|route| route.path().to_string()),
        profile_incomplete: !current.profile_complete(),
        user: current.into(),
    }))
}
