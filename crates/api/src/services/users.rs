//! User service.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use backoffice_core::{NewUser, User};

use super::ServiceError;
use super::auth::hash_password_blocking;
use crate::db::UserGateway;

/// Account operations.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserGateway>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(users: Arc<dyn UserGateway>) -> Self {
        Self { users }
    }

    /// Hash the password and store the user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Auth` if hashing fails, `ServiceError::Gateway`
    /// if the store fails.
    pub async fn save(&self, new_user: NewUser) -> Result<User, ServiceError> {
        let password_hash = hash_password_blocking(SecretString::from(
            new_user.password.expose_secret().to_owned(),
        ))
        .await?;
        let user = new_user.with_password_hash(password_hash);
        Ok(self.users.save(user).await?)
    }

    /// Fetch a user by username.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Gateway` if the store fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_username(username).await?)
    }

    /// Create an account unless the username is already in use.
    ///
    /// The check is a lookup followed by an insert. Two concurrent signups
    /// for the same name can both pass it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::UsernameTaken` if the username exists.
    pub async fn register(&self, new_user: NewUser) -> Result<User, ServiceError> {
        if self.find_by_username(&new_user.username).await?.is_some() {
            return Err(ServiceError::UsernameTaken(new_user.username));
        }
        self.save(new_user).await
    }
}
