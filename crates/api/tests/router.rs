//! Router tests driven through `tower::ServiceExt::oneshot` against the
//! in-memory store.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tower::ServiceExt;

use backoffice_api::db::MemoryDocumentStore;
use backoffice_api::{ApiConfig, AppState, router};
use backoffice_core::basic_header_value;

const ADMIN: (&str, &str) = ("root", "admin-pass");
const CLIENT: (&str, &str) = ("carol", "client-pass");

fn app() -> Router {
    let config = ApiConfig::in_memory("127.0.0.1".parse().unwrap(), 0);
    router(AppState::new(config, MemoryDocumentStore::new()))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn json_request(method: &str, uri: &str, auth: Option<(&str, &str)>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some((user, pass)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic_header_value(user, pass));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, auth: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, pass)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic_header_value(user, pass));
    }
    builder.body(Body::empty()).unwrap()
}

async fn signup(app: &Router, (username, password): (&str, &str), role: &str) -> Response {
    let body = json!({
        "username": username,
        "password": password,
        "email": format!("{username}@example.com"),
        "role": role,
    });
    send(app, json_request("POST", "/api/users/signup", None, &body)).await
}

/// An app with one admin and one client account.
async fn seeded_app() -> Router {
    let app = app();
    assert_eq!(signup(&app, ADMIN, "ADMIN").await.status(), StatusCode::OK);
    assert_eq!(signup(&app, CLIENT, "CLIENT").await.status(), StatusCode::OK);
    app
}

fn product_body(name: &str, price: f64, category: &str) -> Value {
    json!({
        "name": name,
        "price": price,
        "description": "test product",
        "stock": 5,
        "category": category,
    })
}

async fn create_product(app: &Router, name: &str, price: f64, category: &str) -> Value {
    let response = send(
        app,
        json_request("POST", "/api/products", Some(ADMIN), &product_body(name, price, category)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();

    let response = send(&app, empty_request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");

    let response = send(&app, empty_request("GET", "/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_signup_normalizes_role_and_returns_stored_user() {
    let app = app();

    let client = body_json(signup(&app, ("dave", "pw1"), "CLIENT").await).await;
    assert_eq!(client["role"], "ROLE_CLIENT");
    assert_eq!(client["username"], "dave");
    assert!(client["id"].is_string());
    assert!(client["password"].as_str().unwrap().starts_with("$argon2"));

    let admin = body_json(signup(&app, ("erin", "pw2"), "ROLE_ADMIN").await).await;
    assert_eq!(admin["role"], "ROLE_ADMIN");
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_invalid_bodies() {
    let app = app();
    signup(&app, ("fay", "pw"), "CLIENT").await;

    let again = signup(&app, ("fay", "other"), "CLIENT").await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let bad_email = json!({"username": "gus", "password": "pw", "email": "nope", "role": "CLIENT"});
    let response = send(&app, json_request("POST", "/api/users/signup", None, &bad_email)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let blank_role = json!({"username": "gus", "password": "pw", "email": "g@x.io", "role": " "});
    let response = send(&app, json_request("POST", "/api/users/signup", None, &blank_role)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_hash_token_and_authorities() {
    let app = app();
    let stored = body_json(signup(&app, ("hana", "s3cret"), "ADMIN").await).await;

    let body = json!({"username": "hana", "password": "s3cret"});
    let response = send(&app, json_request("POST", "/api/users/login", None, &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = response.headers()[header::AUTHORIZATION]
        .to_str()
        .unwrap()
        .to_owned();
    let encoded = token.strip_prefix("Basic ").unwrap();
    let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(
        decoded,
        format!("hana:{}", stored["password"].as_str().unwrap())
    );

    let authorities = body_json(response).await;
    assert_eq!(authorities, json!([{"authority": "ROLE_ADMIN"}]));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = app();
    signup(&app, ("ian", "right"), "CLIENT").await;

    for body in [
        json!({"username": "ian", "password": "wrong"}),
        json!({"username": "nobody", "password": "right"}),
    ] {
        let response = send(&app, json_request("POST", "/api/users/login", None, &body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::AUTHORIZATION).is_none());
        assert!(body_bytes(response).await.is_empty());
    }
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let response = send(&app(), empty_request("POST", "/api/users/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Logged out successfully.");
}

// ============================================================================
// Product access control
// ============================================================================

#[tokio::test]
async fn test_products_require_credentials() {
    let app = seeded_app().await;

    let response = send(&app, empty_request("GET", "/api/products", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        r#"Basic realm="backoffice""#
    );

    let response = send(&app, empty_request("GET", "/api/products", Some(("carol", "nope")))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let garbage = Request::builder()
        .uri("/api/products")
        .header(header::AUTHORIZATION, "Bearer abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, garbage).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_client_role_cannot_mutate() {
    let app = seeded_app().await;
    let created = create_product(&app, "Chair", 40.0, "furniture").await;
    let id = created["id"].as_str().unwrap();

    let body = product_body("Stool", 10.0, "furniture");
    let response = send(&app, json_request("POST", "/api/products", Some(CLIENT), &body)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/products/{id}");
    let response = send(&app, json_request("PUT", &uri, Some(CLIENT), &body)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, empty_request("DELETE", &uri, Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, empty_request("GET", &uri, Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Product CRUD
// ============================================================================

#[tokio::test]
async fn test_create_then_read_back() {
    let app = seeded_app().await;
    let created = create_product(&app, "Teapot", 19.99, "kitchen").await;

    let id = created["id"].as_str().unwrap();
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let response = send(&app, empty_request("GET", &format!("/api/products/{id}"), Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched, created);
    assert_eq!(fetched["price"], json!(19.99));
    assert_eq!(fetched["stock"], 5);
}

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let app = seeded_app().await;

    for body in [
        product_body("Free", 0.0, "misc"),
        product_body("Debt", -3.5, "misc"),
        product_body(" ", 3.0, "misc"),
        json!({"name": "No stock", "price": 1.0, "category": "misc"}),
        json!({"name": "Negative", "price": 1.0, "stock": -1, "category": "misc"}),
    ] {
        let response = send(&app, json_request("POST", "/api/products", Some(ADMIN), &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    let response = send(&app, empty_request("GET", "/api/products", Some(ADMIN))).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_missing_product_is_empty_404() {
    let app = seeded_app().await;
    let response = send(&app, empty_request("GET", "/api/products/missing", Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_update_uses_path_id_and_keeps_created_at() {
    let app = seeded_app().await;
    let created = create_product(&app, "Lamp", 25.0, "lighting").await;
    let id = created["id"].as_str().unwrap();

    let mut body = product_body("Lamp v2", 27.5, "lighting");
    body["id"] = json!("some-other-id");
    let response = send(
        &app,
        json_request("PUT", &format!("/api/products/{id}"), Some(ADMIN), &body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["name"], "Lamp v2");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);

    let response = send(&app, empty_request("GET", "/api/products/some-other-id", Some(ADMIN))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_body_id_updates() {
    let app = seeded_app().await;
    let created = create_product(&app, "Mat", 12.0, "yoga").await;

    let mut body = product_body("Mat Pro", 15.0, "yoga");
    body["id"] = created["id"].clone();
    let response = send(&app, json_request("POST", "/api/products", Some(ADMIN), &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, empty_request("GET", "/api/products", Some(ADMIN))).await;
    let all = body_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["name"], "Mat Pro");
}

#[tokio::test]
async fn test_delete_is_always_ok() {
    let app = seeded_app().await;
    let created = create_product(&app, "Vase", 30.0, "decor").await;
    let uri = format!("/api/products/{}", created["id"].as_str().unwrap());

    for _ in 0..2 {
        let response = send(&app, empty_request("DELETE", &uri, Some(ADMIN))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    let response = send(&app, empty_request("GET", &uri, Some(ADMIN))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Listing and filters
// ============================================================================

#[tokio::test]
async fn test_pagination_windows() {
    let app = seeded_app().await;
    for i in 0..25 {
        create_product(&app, &format!("Item {i}"), 1.0, "bulk").await;
    }

    let page = |query: &str| {
        let app = app.clone();
        let uri = format!("/api/products{query}");
        async move {
            let response = send(&app, empty_request("GET", &uri, Some(CLIENT))).await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await.as_array().unwrap().clone()
        }
    };

    let default = page("").await;
    assert_eq!(default.len(), 10);
    assert_eq!(default[0]["name"], "Item 0");

    let last = page("?page=2&size=10").await;
    assert_eq!(last.len(), 5);
    assert_eq!(last[4]["name"], "Item 24");

    assert!(page("?page=3&size=10").await.is_empty());
    assert_eq!(page("?page=0&size=25").await.len(), 25);

    let response = send(&app, empty_request("GET", "/api/products?size=0", Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, empty_request("GET", "/api/products?page=-1", Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_and_price_filters() {
    let app = seeded_app().await;
    create_product(&app, "Pen", 2.5, "office").await;
    create_product(&app, "Desk", 150.0, "office").await;
    create_product(&app, "Sofa", 600.0, "living room").await;

    let response = send(&app, empty_request("GET", "/api/products/category/office", Some(CLIENT))).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = send(
        &app,
        empty_request("GET", "/api/products/category/living%20room", Some(CLIENT)),
    )
    .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, empty_request("GET", "/api/products/category/garden", Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let response = send(
        &app,
        empty_request("GET", "/api/products/price?min=2.5&max=150", Some(CLIENT)),
    )
    .await;
    let names: Vec<Value> = body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].clone())
        .collect();
    assert_eq!(names, [json!("Pen"), json!("Desk")]);

    let response = send(
        &app,
        empty_request("GET", "/api/products/price?min=700&max=100", Some(CLIENT)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let response = send(&app, empty_request("GET", "/api/products/price?min=1", Some(CLIENT))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        empty_request("GET", "/api/products/price?min=abc&max=3", Some(CLIENT)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_request_id_is_recorded_on_request_span() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "span-check-42")
        .body(Body::empty())
        .unwrap();
    let response = send(&app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let line = output
        .lines()
        .find(|line| line.contains("finished processing request"))
        .unwrap();
    assert!(line.contains("request_id="), "{line}");
    assert!(line.contains("span-check-42"), "{line}");
}
