//! User route handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;

use backoffice_core::{LoginRequest, NewUser, SignupRequest, User};

use crate::error::{AppError, Result};
use crate::services::AuthService;
use crate::state::AppState;

/// Body returned by logout.
pub const LOGOUT_MESSAGE: &str = "Logged out successfully.";

/// Register a user.
///
/// The role is normalized to its `ROLE_` form. The stored document is
/// returned as is, password hash included.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<User>> {
    let new_user = NewUser::try_from(request)?;
    let user = state.users().register(new_user).await?;
    tracing::info!(username = %user.username, role = %user.role, "User registered");
    Ok(Json(user))
}

/// Check a username/password pair.
///
/// On success the `Authorization` header carries
/// `Basic base64(username:<stored hash>)` and the body lists the user's
/// authorities. Any failure is a bare 401.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let LoginRequest { username, password } = request;
    let password = SecretString::from(password);

    let user = state.auth().authenticate(&username, &password).await?;

    let token = HeaderValue::from_str(&AuthService::credential_token(&user))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(username = %user.username, "User logged in");

    Ok(([(header::AUTHORIZATION, token)], Json(user.authorities())).into_response())
}

/// Log out. There is no server-side session, so this only acknowledges.
pub async fn logout() -> &'static str {
    LOGOUT_MESSAGE
}
