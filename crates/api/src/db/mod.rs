//! Persistence gateway over the document store.
//!
//! # Collections
//!
//! - `products` - Catalog products, paged in insertion order
//! - `users` - Back office accounts, looked up by username
//!
//! # Backends
//!
//! - [`PgDocumentStore`] - `PostgreSQL` used as a document store (JSONB bodies)
//! - [`MemoryDocumentStore`] - In-process store for local runs and tests
//!
//! The gateway never retries. A failing store surfaces as [`GatewayError`]
//! and the caller decides what to do with it.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p backoffice-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use backoffice_core::{Product, ProductId, User};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Collection holding product documents.
pub const PRODUCTS: &str = "products";

/// Collection holding user documents.
pub const USERS: &str = "users";

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be decoded or encoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// A zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page index, starting at 0.
    pub page: u32,
    /// Items per page, at least 1.
    pub size: u32,
}

impl PageRequest {
    /// Number of items to skip before this page starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Product collection operations.
#[async_trait]
pub trait ProductGateway: Send + Sync {
    /// Insert or replace a product, assigning an id when it has none.
    ///
    /// Replacing an existing document keeps its original `createdAt`.
    async fn save(&self, product: Product) -> Result<Product, GatewayError>;

    /// Fetch a product by id.
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, GatewayError>;

    /// Fetch one page of products in insertion order.
    async fn find_page(&self, page: PageRequest) -> Result<Vec<Product>, GatewayError>;

    /// Delete a product. Deleting a missing id is not an error.
    async fn delete_by_id(&self, id: &ProductId) -> Result<(), GatewayError>;

    /// Products whose category equals `category` exactly.
    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, GatewayError>;

    /// Products priced within `[min, max]`, bounds inclusive.
    async fn find_by_price_between(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, GatewayError>;
}

/// User collection operations.
#[async_trait]
pub trait UserGateway: Send + Sync {
    /// Insert or replace a user, assigning an id when it has none.
    async fn save(&self, user: User) -> Result<User, GatewayError>;

    /// Fetch a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, GatewayError>;
}

/// Liveness of the underlying store, used by the readiness probe.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Succeeds if the store answers a trivial request.
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// Generate a fresh document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
