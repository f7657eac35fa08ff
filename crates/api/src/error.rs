//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built, and their details never
//! reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use backoffice_core::{ProductError, UserError};

use crate::db::GatewayError;
use crate::services::{AuthError, ServiceError};

/// Application-level error type for the REST API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Product body failed validation.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// Signup body failed validation.
    #[error("Invalid user: {0}")]
    InvalidUser(#[from] UserError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Request conflicts with stored state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => Self::BadRequest(msg),
            ServiceError::UsernameTaken(_) => Self::Conflict(err.to_string()),
            ServiceError::Auth(auth) => auth.into(),
            ServiceError::Gateway(gateway) => Self::Gateway(gateway),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized,
            AuthError::PasswordHash | AuthError::Task(_) => Self::Internal(err.to_string()),
            AuthError::Gateway(gateway) => Self::Gateway(gateway),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Gateway(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidProduct(_) | Self::InvalidUser(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Gateway(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Not-found and auth failures carry no body
        match self {
            Self::Gateway(_) | Self::Internal(_) => {
                (status, "Internal server error").into_response()
            }
            Self::NotFound(_) | Self::Unauthorized | Self::Forbidden => status.into_response(),
            Self::InvalidProduct(err) => (status, err.to_string()).into_response(),
            Self::InvalidUser(err) => (status, err.to_string()).into_response(),
            Self::Conflict(msg) | Self::BadRequest(msg) => (status, msg).into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful authentication.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}
