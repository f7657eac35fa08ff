//! HTTP Basic credentials.
//!
//! The client shell re-sends `username:password` with every request as an
//! `Authorization: Basic <base64>` header. There is no session token and
//! nothing expires; the server re-validates the pair on each call.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Scheme prefix of a Basic `Authorization` header value.
const BASIC_SCHEME: &str = "Basic";

/// Errors that can occur when decoding a Basic `Authorization` header.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The header does not use the Basic scheme.
    #[error("authorization scheme must be Basic")]
    WrongScheme,
    /// The token is not valid base64.
    #[error("credential token is not valid base64")]
    InvalidEncoding,
    /// The decoded token is not UTF-8.
    #[error("credential token is not valid UTF-8")]
    InvalidUtf8,
    /// The decoded token has no `:` separator or an empty username.
    #[error("credential token must be username:password")]
    Malformed,
}

/// A username/password pair.
///
/// The password is held as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    /// Create credentials from a username and clear-text password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    /// Render the full header value, e.g. `Basic dXNlcjpwYXNz`.
    #[must_use]
    pub fn header_value(&self) -> String {
        basic_header_value(&self.username, self.password.expose_secret())
    }

    /// Decode a Basic `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively. Everything after the first
    /// `:` is the password, so passwords may themselves contain colons.
    ///
    /// # Errors
    ///
    /// Returns a `CredentialError` describing why the header is unusable.
    pub fn from_header_value(value: &str) -> Result<Self, CredentialError> {
        let (scheme, token) = value
            .trim()
            .split_once(' ')
            .ok_or(CredentialError::WrongScheme)?;
        if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
            return Err(CredentialError::WrongScheme);
        }

        let decoded = STANDARD
            .decode(token.trim())
            .map_err(|_| CredentialError::InvalidEncoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::InvalidUtf8)?;

        match decoded.split_once(':') {
            Some((username, password)) if !username.is_empty() => Ok(Self::new(
                username,
                SecretString::from(password.to_owned()),
            )),
            _ => Err(CredentialError::Malformed),
        }
    }
}

/// Encode `username:secret` into a Basic header value.
///
/// The server uses this with the stored password hash as `secret` to build
/// the token returned by login.
#[must_use]
pub fn basic_header_value(username: &str, secret: &str) -> String {
    let token = STANDARD.encode(format!("{username}:{secret}"));
    format!("{BASIC_SCHEME} {token}")
}

/// A permission granted to an authenticated user.
///
/// Login answers with a list of these, one per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedAuthority {
    /// The role name, e.g. `ROLE_ADMIN`.
    pub authority: String,
}
