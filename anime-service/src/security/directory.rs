//! User lookup backends

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{PasswordEncoder, Role, UserAccount};
use crate::error::Error;

/// Source of user accounts, looked up by username
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, Error>;
}

/// Accounts held in memory, usually loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, UserAccount>,
}

impl InMemoryUserDirectory {
    pub fn new(users: impl IntoIterator<Item = UserAccount>) -> Self {
        let users: HashMap<_, _> = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();

        let plaintext: Vec<&str> = users
            .values()
            .filter(|user| PasswordEncoder::is_plaintext(&user.password))
            .map(|user| user.username.as_str())
            .collect();
        if !plaintext.is_empty() {
            tracing::warn!(
                users = ?plaintext,
                "Accounts with {{noop}} plaintext passwords are configured; use only for development"
            );
        }

        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, Error> {
        Ok(self.users.get(username).cloned())
    }
}

/// Consults each directory in order; the first hit wins
#[derive(Clone, Default)]
pub struct ChainedUserDirectory {
    directories: Vec<Arc<dyn UserDirectory>>,
}

impl ChainedUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directories.push(directory);
        self
    }
}

#[async_trait]
impl UserDirectory for ChainedUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, Error> {
        for directory in &self.directories {
            if let Some(user) = directory.find_by_username(username).await? {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

/// Parse a comma-separated authority list, skipping unknown roles
#[cfg_attr(not(feature = "database"), allow(dead_code))]
fn parse_authorities(username: &str, authorities: &str) -> Vec<Role> {
    authorities
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(username, "Ignoring authority: {}", e);
                None
            }
        })
        .collect()
}

/// Accounts stored in the `user_system` table
#[cfg(feature = "database")]
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: sqlx::PgPool,
}

#[cfg(feature = "database")]
impl PgUserDirectory {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, Error> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT username, password, authorities FROM user_system WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("User lookup failed: {}", e)))?;

        Ok(row.map(|(username, password, authorities)| {
            let roles = parse_authorities(&username, &authorities);
            UserAccount {
                username,
                password,
                roles,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mario() -> UserAccount {
        UserAccount::new("mario", "{noop}academy", vec![Role::User])
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let directory = InMemoryUserDirectory::new([mario()]);

        let found = directory.find_by_username("mario").await.unwrap().unwrap();
        assert_eq!(found.roles, vec![Role::User]);
        assert!(directory.find_by_username("luigi").await.unwrap().is_none());
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_chain_first_hit_wins() {
        let first = InMemoryUserDirectory::new([UserAccount::new(
            "mario",
            "{noop}first",
            vec![Role::Admin],
        )]);
        let second = InMemoryUserDirectory::new([
            mario(),
            UserAccount::new("pehenmo", "{noop}academy", vec![Role::Admin]),
        ]);
        let chain = ChainedUserDirectory::new()
            .with(Arc::new(first))
            .with(Arc::new(second));

        let mario = chain.find_by_username("mario").await.unwrap().unwrap();
        assert_eq!(mario.password, "{noop}first");
        assert!(chain.find_by_username("pehenmo").await.unwrap().is_some());
        assert!(chain.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_chain_finds_nothing() {
        let chain = ChainedUserDirectory::new();
        assert!(chain.find_by_username("mario").await.unwrap().is_none());
    }

    #[test]
    fn test_parse_authorities() {
        assert_eq!(
            parse_authorities("pehenmo", "ROLE_ADMIN, ROLE_USER"),
            vec![Role::Admin, Role::User]
        );
        assert_eq!(parse_authorities("mario", "ROLE_USER,,GUEST"), vec![Role::User]);
        assert!(parse_authorities("nobody", "").is_empty());
    }
}
