//! User document and the request bodies that create or authenticate one.

use core::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError, GrantedAuthority, Role, RoleError, UserId};

/// Errors raised while validating a signup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    /// The username is empty or whitespace.
    #[error("username is mandatory")]
    BlankUsername,

    /// The username contains a `:`, which Basic credentials cannot carry.
    #[error("username must not contain ':'")]
    InvalidUsername,

    /// The password is empty.
    #[error("password is mandatory")]
    BlankPassword,

    /// The email is invalid.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// The role is invalid.
    #[error(transparent)]
    Role(#[from] RoleError),
}

/// A stored back office user.
///
/// `password_hash` is serialized under the `password` key and only ever
/// holds the one-way hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub email: Email,
    pub role: Role,
}

impl User {
    /// Permissions granted to this user, one per role.
    #[must_use]
    pub fn authorities(&self) -> Vec<GrantedAuthority> {
        vec![GrantedAuthority {
            authority: self.role.as_str().to_owned(),
        }]
    }
}

/// A validated signup whose password has not been hashed yet.
///
/// Converting this into a [`User`] is the only way to persist it, and that
/// conversion consumes the clear-text password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: SecretString,
    pub email: Email,
    pub role: Role,
}

impl NewUser {
    /// Finish the conversion into a [`User`] once the password is hashed.
    #[must_use]
    pub fn with_password_hash(self, password_hash: String) -> User {
        User {
            id: None,
            username: self.username,
            password_hash,
            email: self.email,
            role: self.role,
        }
    }
}

/// Signup request body.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

impl TryFrom<SignupRequest> for NewUser {
    type Error = UserError;

    fn try_from(request: SignupRequest) -> Result<Self, Self::Error> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(UserError::BlankUsername);
        }
        if username.contains(':') {
            return Err(UserError::InvalidUsername);
        }
        if request.password.is_empty() {
            return Err(UserError::BlankPassword);
        }

        Ok(Self {
            username: username.to_owned(),
            email: Email::parse(&request.email)?,
            role: Role::normalize(&request.role)?,
            password: SecretString::from(request.password),
        })
    }
}

/// Login request body.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn signup(role: &str) -> SignupRequest {
        SignupRequest {
            username: "dana".to_owned(),
            password: "pa55word".to_owned(),
            email: "dana@example.com".to_owned(),
            role: role.to_owned(),
        }
    }

    #[test]
    fn test_signup_normalizes_role() {
        let client = NewUser::try_from(signup("CLIENT")).unwrap();
        assert_eq!(client.role.as_str(), "ROLE_CLIENT");

        let admin = NewUser::try_from(signup("ROLE_ADMIN")).unwrap();
        assert_eq!(admin.role.as_str(), "ROLE_ADMIN");
    }

    #[test]
    fn test_signup_requires_fields() {
        let mut request = signup("CLIENT");
        request.username = " ".to_owned();
        assert_eq!(
            NewUser::try_from(request).unwrap_err(),
            UserError::BlankUsername
        );

        let mut request = signup("CLIENT");
        request.password = String::new();
        assert_eq!(
            NewUser::try_from(request).unwrap_err(),
            UserError::BlankPassword
        );

        let mut request = signup("CLIENT");
        request.email = "nope".to_owned();
        assert!(matches!(
            NewUser::try_from(request).unwrap_err(),
            UserError::Email(_)
        ));
    }

    #[test]
    fn test_with_password_hash_drops_clear_text() {
        let new_user = NewUser::try_from(signup("CLIENT")).unwrap();
        assert_eq!(new_user.password.expose_secret(), "pa55word");

        let user = new_user.with_password_hash("$argon2id$stub".to_owned());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["password"], "$argon2id$stub");
        assert!(!json.to_string().contains("pa55word"));
    }

    #[test]
    fn test_authorities_list_role() {
        let user = NewUser::try_from(signup("ADMIN"))
            .unwrap()
            .with_password_hash(String::new());
        assert_eq!(
            user.authorities(),
            vec![GrantedAuthority {
                authority: "ROLE_ADMIN".to_owned()
            }]
        );
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let debug = format!("{:?}", signup("CLIENT"));
        assert!(!debug.contains("pa55word"));
    }
}
