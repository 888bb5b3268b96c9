//! Route definitions for the Bankiti API

mod auth;
mod borrower;
mod lender;
mod pages;

pub use auth::auth_routes;
pub use borrower::borrower_routes;
pub use lender::lender_routes;
pub use pages::page_routes;
