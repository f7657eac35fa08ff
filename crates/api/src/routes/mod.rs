//! HTTP route handlers for the REST API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (store ping)
//!
//! # Products (Basic auth, mutations need ROLE_ADMIN)
//! GET    /api/products?page&size      - Paged list (defaults 0/10)
//! POST   /api/products                - Create, or update when the body has an id
//! GET    /api/products/{id}           - Fetch one, 404 if absent
//! PUT    /api/products/{id}           - Update, path id wins
//! DELETE /api/products/{id}           - Delete, always 200
//! GET    /api/products/category/{c}   - Exact category match
//! GET    /api/products/price?min&max  - Inclusive price range
//!
//! # Users (no auth)
//! POST   /api/users/signup            - Register
//! POST   /api/users/login             - Check credentials, return token header
//! POST   /api/users/logout            - No-op
//! ```

pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, StatusCode, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/price", get(products::by_price))
        .route("/category/{category}", get(products::by_category))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
}

/// Build the complete application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/products", product_routes())
        .nest("/users", user_routes());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Any origin may call the API and read the login token header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::AUTHORIZATION, HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the document store does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.health().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
