//! Application roles.
//!
//! Roles are free-form strings that always carry the `ROLE_` marker once
//! normalized, so `CLIENT` and `ROLE_CLIENT` name the same role.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when normalizing a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The role is empty or whitespace.
    #[error("role is mandatory")]
    Empty,
}

/// A normalized role, always prefixed with [`Role::PREFIX`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Marker prepended to every role name.
    pub const PREFIX: &'static str = "ROLE_";

    /// Role for back office administrators.
    pub const ADMIN: &'static str = "ROLE_ADMIN";

    /// Role for read-only clients.
    pub const CLIENT: &'static str = "ROLE_CLIENT";

    /// Normalize a raw role name, adding the prefix if it is missing.
    ///
    /// Prefixing is idempotent:
    ///
    /// ```
    /// use backoffice_core::Role;
    ///
    /// assert_eq!(Role::normalize("CLIENT").unwrap().as_str(), "ROLE_CLIENT");
    /// assert_eq!(Role::normalize("ROLE_ADMIN").unwrap().as_str(), "ROLE_ADMIN");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `RoleError::Empty` if the name is blank.
    pub fn normalize(raw: &str) -> Result<Self, RoleError> {
        let raw = raw.trim();
        if raw.is_empty() || raw == Self::PREFIX {
            return Err(RoleError::Empty);
        }
        if raw.starts_with(Self::PREFIX) {
            Ok(Self(raw.to_owned()))
        } else {
            Ok(Self(format!("{}{raw}", Self::PREFIX)))
        }
    }

    /// The administrator role.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// The client role.
    #[must_use]
    pub fn client() -> Self {
        Self(Self::CLIENT.to_owned())
    }

    /// Whether this is the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// The full role name including the prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::normalize(&raw).map_err(serde::de::Error::custom)
    }
}
