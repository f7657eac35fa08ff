//! Basic authentication extractors.
//!
//! There is no session. Every protected request carries
//! `Authorization: Basic base64(username:password)` and the pair is checked
//! against the stored argon2 hash each time.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use backoffice_core::{BasicCredentials, User};

use crate::error::{AppError, set_sentry_user};
use crate::services::AuthError;
use crate::state::AppState;

/// Challenge sent with every 401 from a protected route.
pub const WWW_AUTHENTICATE_CHALLENGE: &str = r#"Basic realm="backoffice""#;

/// Extractor that requires valid Basic credentials.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires valid Basic credentials of a `ROLE_ADMIN` user.
pub struct RequireAdmin(pub User);

/// Error returned when a protected route cannot be served.
#[derive(Debug)]
pub enum AuthRejection {
    /// No usable credentials, or they did not match.
    Unauthorized,
    /// Authenticated, but the role does not allow the operation.
    Forbidden,
    /// The credential check itself failed.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(WWW_AUTHENTICATE_CHALLENGE),
                )],
            )
                .into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthRejection::Unauthorized)?;

        let credentials = BasicCredentials::from_header_value(value).map_err(|err| {
            tracing::debug!(error = %err, "Rejected authorization header");
            AuthRejection::Unauthorized
        })?;

        match state
            .auth()
            .authenticate(credentials.username(), credentials.password())
            .await
        {
            Ok(user) => {
                set_sentry_user(&user.username);
                Ok(Self(user))
            }
            Err(AuthError::InvalidCredentials) => {
                tracing::info!(username = %credentials.username(), "Invalid credentials");
                Err(AuthRejection::Unauthorized)
            }
            Err(err) => Err(AuthRejection::Failed(err.into())),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            tracing::info!(username = %user.username, role = %user.role, "Admin role required");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}
