//! Authentication service.
//!
//! Checks Basic credentials against the argon2 hash stored on the user
//! document and builds the credential token returned by login.
//!
//! Argon2 is CPU-bound, so hashing and verification run on tokio's blocking
//! pool. Unknown usernames are checked against a throwaway hash so they cost
//! the same as a wrong password.

mod error;

pub use error::AuthError;

use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use backoffice_core::{User, basic_header_value};

use crate::db::UserGateway;

/// Verified against when the username is unknown.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown user").ok());

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserGateway>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserGateway>) -> Self {
        Self { users }
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user does not exist or
    /// the password does not match, `AuthError::Gateway` if the lookup fails.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        let user = self.users.find_by_username(username).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = SecretString::from(password.expose_secret().to_owned());

        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(password.expose_secret(), &hash),
            None => {
                if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                    let _ = verify_password(password.expose_secret(), hash);
                }
                Err(AuthError::InvalidCredentials)
            }
        })
        .await??;

        user.ok_or(AuthError::InvalidCredentials)
    }

    /// Token returned in the `Authorization` header of a successful login.
    ///
    /// Encodes `username:<stored hash>`, never the clear-text password.
    #[must_use]
    pub fn credential_token(user: &User) -> String {
        basic_header_value(&user.username, &user.password_hash)
    }
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails, `AuthError::Task` if
/// the blocking task panics.
pub async fn hash_password_blocking(password: SecretString) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(password.expose_secret())).await?
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is unparseable or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use backoffice_core::{BasicCredentials, Email, Role};

    use super::*;
    use crate::db::MemoryDocumentStore;

    async fn service_with_user(password: &str) -> (AuthService, User) {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = User {
            id: None,
            username: "gina".to_owned(),
            password_hash: hash_password(password).unwrap(),
            email: Email::parse("gina@example.com").unwrap(),
            role: Role::client(),
        };
        let user = UserGateway::save(store.as_ref(), user).await.unwrap();
        (AuthService::new(store), user)
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("pw", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (service, stored) = service_with_user("correct horse").await;

        let user = service
            .authenticate("gina", &SecretString::from("correct horse"))
            .await
            .unwrap();
        assert_eq!(user, stored);

        let wrong = service
            .authenticate("gina", &SecretString::from("battery staple"))
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown = service
            .authenticate("nobody", &SecretString::from("correct horse"))
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_unknown_user_hash_matches_nothing() {
        let hash = UNKNOWN_USER_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("", hash).is_err());
    }

    #[tokio::test]
    async fn test_hash_password_blocking() {
        let hash = hash_password_blocking(SecretString::from("s3cret"))
            .await
            .unwrap();
        assert!(verify_password("s3cret", &hash).is_ok());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_authenticate_leaves_runtime_free() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (service, _) = service_with_user("pw").await;
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    tokio::task::yield_now().await;
                    ticks.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        for _ in 0..3 {
            service
                .authenticate("gina", &SecretString::from("pw"))
                .await
                .unwrap();
            service
                .authenticate("nobody", &SecretString::from("pw"))
                .await
                .unwrap_err();
        }
        ticker.abort();

        // The single runtime thread kept running other tasks while hashing
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn test_credential_token_carries_stored_hash() {
        let (_, user) = service_with_user("pw").await;
        let token = AuthService::credential_token(&user);

        let decoded = BasicCredentials::from_header_value(&token).unwrap();
        assert_eq!(decoded.username(), "gina");
        assert_eq!(decoded.password().expose_secret(), user.password_hash);
    }
}
