//! Admin account bootstrap.
//!
//! The shell only ever signs up `ROLE_CLIENT` accounts, so the first admin
//! is created here through the same signup endpoint.
//!
//! # Usage
//!
//! ```bash
//! BACKOFFICE_ADMIN_PASSWORD=... bo-cli admin create -u root -e root@example.com
//! ```

use backoffice_cli::{ApiClient, ClientError};
use backoffice_core::SignupRequest;
use secrecy::{ExposeSecret, SecretString};

/// Create an account with `ROLE_ADMIN`.
///
/// # Errors
///
/// Returns `ClientError::Status` if the server rejects the signup, for
/// example when the username is taken.
pub async fn create(
    client: &ApiClient,
    username: &str,
    email: &str,
    password: &SecretString,
) -> Result<(), ClientError> {
    let request = SignupRequest {
        username: username.to_owned(),
        password: password.expose_secret().to_owned(),
        email: email.to_owned(),
        role: "ADMIN".to_owned(),
    };

    let user = client.signup(&request).await?;
    tracing::info!(
        username = %user.username,
        role = %user.role,
        "Admin account created"
    );
    Ok(())
}
