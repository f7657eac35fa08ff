//! Documents stored by the back office.
//!
//! Each entity serializes to the camelCase JSON shape used both on the wire
//! and inside the document store.

pub mod product;
pub mod user;

pub use product::{Product, ProductDraft, ProductError};
pub use user::{LoginRequest, NewUser, SignupRequest, User, UserError};
