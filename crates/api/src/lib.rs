//! Back office REST API.
//!
//! Serves the product catalog and user accounts over JSON, guarded by HTTP
//! Basic authentication, on top of a document store.
//!
//! # Architecture
//!
//! ```text
//! routes (axum handlers + auth extractors)
//!   -> services (ProductService, UserService, AuthService)
//!     -> db gateways (ProductGateway, UserGateway)
//!       -> PgDocumentStore | MemoryDocumentStore
//! ```
//!
//! [`AppState::new`] wires services to a store and [`routes::router`] wires
//! handlers to the state. The binary in `main.rs` only adds configuration,
//! Sentry and tracing around them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, ConfigError, StoreBackend};
pub use error::AppError;
pub use routes::router;
pub use state::AppState;
