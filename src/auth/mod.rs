//! Authentication
//!
//! Handles:
//! - Password hashing (argon2)
//! - Signed session tokens
//! - Current-user extraction for protected routes

mod middleware;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, SESSION_COOKIE, extract_token_from_headers};
pub use password::{hash_password, verify_password};
pub use session::{Session, create_session_token, verify_session_token};
