//! Back office client library.
//!
//! - [`client`] - HTTP client for the REST API with the in-memory
//!   credential store
//! - [`shell`] - Interactive terminal shell built on the client
//!
//! The `bo-cli` binary adds operator commands (`migrate`, `admin create`)
//! on top.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod shell;

pub use client::{ApiClient, ClientError, CredentialStore};
pub use shell::{Command, Dashboard, Shell, ShellError};

/// API root used when neither `--api-url` nor `BACKOFFICE_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://localhost:8081/api";
