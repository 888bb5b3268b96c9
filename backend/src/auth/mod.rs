//! Authentication module for Bankiti
//!
//! - Email/password accounts with bcrypt hashes
//! - JWT session tokens whose `jti` names a stored session record
//! - Sign-out removes the session record, invalidating the token

mod jwt;
mod password;
mod service;

pub use jwt::{generate_access_token, verify_token, Claims, JwtError};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService};
