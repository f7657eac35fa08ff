//! Back office core - entity model and value types.
//!
//! This crate provides the types shared by every back office component:
//! - `api` - REST server over the product and user collections
//! - `cli` - Interactive client shell and operator commands
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Both the server and the client shell depend on it
//! so the JSON wire shapes stay in one place.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, roles and credentials
//! - [`entity`] - The `Product` and `User` documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entity;
pub mod types;

pub use entity::*;
pub use types::*;
