//! Roles, credentials and server-side session issuance.
//!
//! Credential validity and role authorization are checked independently:
//! a valid clinic user logging in at the doctor portal is rejected with
//! [`AuthError::PermissionDenied`] *after* authentication, never conflated
//! with a bad password.

pub mod password;
pub mod profile;
pub mod role;
pub mod service;
pub mod token;

pub use profile::Profile;
pub use role::{Role, RoleSet};

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Account missing, password never set, account inactive, or password
    /// mismatch. Deliberately collapsed into one message.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Credentials were valid but the account's role set excludes the
    /// portal's required role.
    #[error("Account is not permitted to use this portal")]
    PermissionDenied,

    #[error("Session missing or expired")]
    SessionExpired,

    #[error("Unknown role marker: {0}")]
    UnknownRoleMarker(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
