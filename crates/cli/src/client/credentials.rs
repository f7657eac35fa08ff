//! In-memory credential store.
//!
//! Holds the username and clear-text password typed at login for as long as
//! the shell runs. Nothing is written to disk.

use reqwest::header::HeaderValue;
use secrecy::SecretString;

use backoffice_core::BasicCredentials;

/// The active login, if any.
#[derive(Debug, Default)]
pub struct CredentialStore {
    active: Option<BasicCredentials>,
}

impl CredentialStore {
    /// An empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Replace the active credentials.
    pub fn set(&mut self, username: impl Into<String>, password: SecretString) {
        self.active = Some(BasicCredentials::new(username, password));
    }

    /// Forget the active credentials.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Whether a login is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Username of the active login.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.active.as_ref().map(BasicCredentials::username)
    }

    /// `Authorization` header for the active login, marked sensitive so
    /// HTTP debug output never shows it.
    #[must_use]
    pub fn authorization_header(&self) -> Option<HeaderValue> {
        let credentials = self.active.as_ref()?;
        let mut value = HeaderValue::from_str(&credentials.header_value()).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}
