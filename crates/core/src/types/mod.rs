//! Value types for the back office.
//!
//! This module provides type-safe wrappers for the domain's primitive fields.

pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use credential::{BasicCredentials, CredentialError, GrantedAuthority, basic_header_value};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleError};
