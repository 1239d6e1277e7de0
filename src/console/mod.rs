//! Console-side session handling for the portal dashboards.
//!
//! Mirrors what the browser dashboards do: a durable token vault, a session
//! state machine that rehydrates on startup and never surfaces rehydration
//! errors, and admin actions that confirm against the server before any
//! local state changes.

pub mod actions;
pub mod session;
pub mod vault;

pub use actions::{Notification, StatusChangeOutcome};
pub use session::{AuthState, SessionClient};
pub use vault::TokenVault;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Blocks submission before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account not allowed on this portal")]
    PermissionDenied,

    #[error("network or server error: {0}")]
    NetworkOrServer(String),

    #[error("token vault error: {0}")]
    Vault(#[from] std::io::Error),
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::NetworkOrServer(err.to_string())
    }
}
