//! API handlers for the Bankiti backend

pub mod auth;
pub mod borrower;
pub mod health;
pub mod home;
pub mod lender;
pub mod profile;

// Re-export the guard extractors for handler use
pub use crate::middleware::auth::{AuthenticatedUser, BorrowerUser, LenderUser};
