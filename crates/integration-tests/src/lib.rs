//! End-to-end tests for the back office.
//!
//! Each test starts its own API server on an ephemeral port over the
//! in-memory document store, then talks to it through the real
//! [`backoffice_cli::ApiClient`] or a scripted [`backoffice_cli::Shell`].
//! No database or external server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p backoffice-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Cursor};
use std::net::{Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use backoffice_api::db::MemoryDocumentStore;
use backoffice_api::{ApiConfig, AppState, router};
use backoffice_cli::{ApiClient, ClientError, Shell, ShellError};
use backoffice_core::SignupRequest;

/// An API server running on a background task.
///
/// The task is aborted when the server is dropped.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and serve a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;

        let config = ApiConfig::in_memory(addr.ip(), addr.port());
        let app = router(AppState::new(config, MemoryDocumentStore::new()));

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, handle })
    }

    /// Root of the REST API, e.g. `http://127.0.0.1:40123/api`.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// A logged-out client pointed at this server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the URL cannot be parsed.
    pub fn client(&self) -> Result<ApiClient, ClientError> {
        ApiClient::new(&self.api_url())
    }

    /// Register an account with the given role.
    ///
    /// # Errors
    ///
    /// Returns the client error if the signup is refused.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<(), ClientError> {
        let request = SignupRequest {
            username: username.to_owned(),
            password: password.to_owned(),
            email: format!("{username}@example.com"),
            role: role.to_owned(),
        };
        self.client()?.signup(&request).await.map(drop)
    }

    /// A client already logged in as `username`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::LoginRejected` if the pair is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<ApiClient, ClientError> {
        let mut client = self.client()?;
        client
            .login(username, SecretString::from(password.to_owned()))
            .await?;
        Ok(client)
    }

    /// Run a shell session over `script` and return everything it printed.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Io` if the shell cannot write its output.
    pub async fn run_shell(&self, script: &str) -> Result<String, ShellError> {
        let client = self.client()?;
        let mut shell = Shell::new(client, Cursor::new(script.as_bytes().to_vec()), Vec::new());
        shell.run().await?;
        Ok(String::from_utf8_lossy(&shell.into_output()).into_owned())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
