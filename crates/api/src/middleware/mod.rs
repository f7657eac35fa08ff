//! HTTP middleware stack for the REST API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (any origin, `Authorization` exposed)
//!
//! Authentication is not a layer: product handlers take a [`RequireUser`] or
//! [`RequireAdmin`] extractor so every call re-checks its Basic credentials.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, RequireAdmin, RequireUser};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
