//! Authentication error types.

use thiserror::Error;

use crate::db::GatewayError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are indistinguishable on
    /// purpose so callers cannot probe for accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// The blocking hash task panicked or was cancelled.
    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Gateway/store error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
