//! HTTP client for the back office REST API.
//!
//! Every product call carries the `Authorization` header rendered from the
//! [`CredentialStore`]. The header returned by login is only checked for
//! presence; later calls re-send the clear-text password the user typed.

mod credentials;

pub use credentials::CredentialStore;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use backoffice_core::{GrantedAuthority, Product, ProductDraft, SignupRequest, User};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL or an endpoint could not be built.
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport failure or undecodable body.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Login was refused.
    #[error("invalid username or password")]
    LoginRejected,

    /// The server did not accept the stored credentials.
    #[error("not authenticated, please log in")]
    Unauthorized,

    /// The logged-in user lacks the required role.
    #[error("this action requires the admin role")]
    Forbidden,

    /// Any other non-success status.
    #[error("server answered {status}: {message}")]
    Status {
        /// HTTP status
        status: StatusCode,
        /// Response body, usually a validation message
        message: String,
    },
}

/// Client for `/api/products` and `/api/users`.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:8081/api`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client over an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` does not parse.
    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        // A trailing slash makes `Url::join` append instead of replace
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            credentials: CredentialStore::new(),
        })
    }

    /// The API root every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The active credentials.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register an account. The role is sent as given and prefixed by the
    /// server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with the server message if the signup
    /// is invalid or the username is taken.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User, ClientError> {
        let response = self
            .request(Method::POST, "users/signup")?
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// Log in and remember the credentials.
    ///
    /// Credentials are stored only when the server answers with a success
    /// status and an `Authorization` header. Returns the user's authorities.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::LoginRejected` if the server refuses the pair,
    /// `ClientError::Status` for any other failure status.
    pub async fn login(
        &mut self,
        username: &str,
        password: SecretString,
    ) -> Result<Vec<GrantedAuthority>, ClientError> {
        let body = serde_json::json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let response = self
            .request(Method::POST, "users/login")?
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Login refused");
            return Err(ClientError::LoginRejected);
        }
        let response = check(response).await?;
        if !response.headers().contains_key(header::AUTHORIZATION) {
            tracing::warn!(status = %response.status(), "Login answered without a token");
            return Err(ClientError::LoginRejected);
        }

        let authorities: Vec<GrantedAuthority> = response.json().await?;
        self.credentials.set(username, password);
        tracing::debug!(username, "Logged in");
        Ok(authorities)
    }

    /// Forget the credentials, then tell the server.
    ///
    /// The local logout always happens. A failing server call is logged and
    /// otherwise ignored.
    pub async fn logout(&mut self) {
        self.credentials.clear();

        let result = match self.request(Method::POST, "users/logout") {
            Ok(request) => request.send().await.map(drop).map_err(ClientError::from),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "Logout call failed");
        }
    }

    /// Forget the credentials without calling the server.
    pub fn clear_credentials(&mut self) {
        self.credentials.clear();
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` without a valid login.
    pub async fn list_products(&self, page: u32, size: u32) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let response = self.authorized(self.http.get(url)).send().await?;
        decode(response).await
    }

    /// A single product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` without a valid login.
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, ClientError> {
        let url = self.product_url(&[id])?;
        let response = self.authorized(self.http.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` for non-admin users and
    /// `ClientError::Status` for validation failures.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ClientError> {
        let url = self.endpoint("products")?;
        let response = self
            .authorized(self.http.post(url))
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    /// Replace the product stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` for non-admin users and
    /// `ClientError::Status` for validation failures.
    pub async fn update_product(
        &self,
        id: &str,
        draft: &ProductDraft,
    ) -> Result<Product, ClientError> {
        let url = self.product_url(&[id])?;
        let response = self
            .authorized(self.http.put(url))
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    /// Delete a product. Succeeds for unknown ids too.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` for non-admin users.
    pub async fn delete_product(&self, id: &str) -> Result<(), ClientError> {
        let url = self.product_url(&[id])?;
        let response = self.authorized(self.http.delete(url)).send().await?;
        check(response).await.map(drop)
    }

    /// Products in exactly this category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` without a valid login.
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ClientError> {
        let url = self.product_url(&["category", category])?;
        let response = self.authorized(self.http.get(url)).send().await?;
        decode(response).await
    }

    /// Products priced within `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` without a valid login.
    pub async fn products_by_price(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("products/price")?;
        url.query_pairs_mut()
            .append_pair("min", &min.to_string())
            .append_pair("max", &max.to_string());
        let response = self.authorized(self.http.get(url)).send().await?;
        decode(response).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// `products/<segments...>` with every segment percent-encoded.
    fn product_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.endpoint("products")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.authorization_header() {
            Some(value) => request.header(header::AUTHORIZATION, value),
            None => request,
        }
    }
}

/// Map non-success statuses to `ClientError`.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Status { status, message })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check(response).await?.json().await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:8081/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8081/api/");
        assert_eq!(
            client.endpoint("users/login").unwrap().as_str(),
            "http://localhost:8081/api/users/login"
        );

        let client = ApiClient::new("http://localhost:8081/api/").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8081/api/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_product_url_encodes_segments() {
        let client = ApiClient::new("http://localhost:8081/api").unwrap();
        assert_eq!(
            client.product_url(&["category", "living room"]).unwrap().as_str(),
            "http://localhost:8081/api/products/category/living%20room"
        );
        assert_eq!(
            client.product_url(&["a/b"]).unwrap().as_str(),
            "http://localhost:8081/api/products/a%2Fb"
        );
    }

    #[test]
    fn test_new_client_is_logged_out() {
        let client = ApiClient::new("http://localhost:8081/api").unwrap();
        assert!(!client.credentials().is_active());
    }
}
