//! Business logic services for the back office.
//!
//! # Services
//!
//! - `products` - Catalog reads and writes, pagination rules
//! - `users` - Account creation with password hashing
//! - `auth` - Basic credential checks and login tokens
//!
//! Services hold gateway trait objects and know nothing about HTTP.

pub mod auth;
pub mod products;
pub mod users;

pub use auth::{AuthError, AuthService};
pub use products::ProductService;
pub use users::UserService;

use thiserror::Error;

use crate::db::GatewayError;

/// Errors raised by the product and user services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request cannot be served as asked.
    #[error("{0}")]
    BadRequest(String),

    /// Signup for a username that already exists.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// Password hashing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Gateway/store error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
