//! Authentication primitives and the service that composes them.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session token issuance and verification.
//! - [`denylist`] -- revoked token identifiers, for logout.
//! - [`service`] -- register / login / authenticate flows over a user store.

pub mod denylist;
pub mod jwt;
pub mod password;
pub mod service;

pub use service::{AuthService, AuthSession, Authenticated};

/// Failures surfaced by the authentication flows.
///
/// `InvalidCredentials` and `Unauthenticated` deliberately carry no detail:
/// callers must not learn whether the email, the password, the signature or
/// the expiry was at fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed or out-of-range plaintext.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or missing authentication token")]
    Unauthenticated,

    /// Collaborator failure. The message is for logs only.
    #[error("Internal error: {0}")]
    Internal(String),
}
