//! HTTP Basic authentication and role-based access control
//!
//! Requests are authenticated against a [`UserDirectory`] and then checked
//! against an [`AccessPolicy`] by the access control middleware before any
//! handler runs.

mod authenticator;
mod basic;
mod config;
mod directory;
mod password;
mod policy;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use authenticator::Authenticator;
pub use basic::BasicCredentials;
pub use config::{PasswordConfig, SecurityConfig};
#[cfg(feature = "database")]
pub use directory::PgUserDirectory;
pub use directory::{ChainedUserDirectory, InMemoryUserDirectory, UserDirectory};
pub use password::PasswordEncoder;
pub use policy::{AccessPolicy, AccessRule, Requirement};

/// Role granted to a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Parse `USER`/`ADMIN`, case-insensitively, with or without `ROLE_`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("ROLE_"))
            .map_or(trimmed, |_| &trimmed[5..]);
        if name.eq_ignore_ascii_case("USER") {
            Ok(Role::User)
        } else if name.eq_ignore_ascii_case("ADMIN") {
            Ok(Role::Admin)
        } else {
            Err(format!("unknown role '{}'", s))
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// A user account known to a [`UserDirectory`]
#[derive(Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,

    /// Encoded password, e.g. `{argon2}$argon2id$...` or `{noop}secret`
    pub password: String,

    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles,
        }
    }
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("username", &self.username)
            .field("password", &"***")
            .field("roles", &self.roles)
            .finish()
    }
}

/// An authenticated caller
///
/// Inserted into request extensions by the access control middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }
}

impl From<&UserAccount> for Principal {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            roles: account.roles.clone(),
        }
    }
}
