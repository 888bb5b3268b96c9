//! Middleware for the Bankiti API
//!
//! Request tracing and the session/role extractors that guard pages.

pub mod auth;
mod tracing;

pub use auth::{AuthenticatedUser, BorrowerUser, LenderUser};
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
