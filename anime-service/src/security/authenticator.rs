//! Credential verification

use std::sync::Arc;

use super::{BasicCredentials, PasswordEncoder, Principal, UserDirectory};
use crate::error::Error;

/// Message of the error raised for unknown users and wrong passwords
pub const BAD_CREDENTIALS: &str = "Bad credentials";

/// Verifies Basic credentials against a [`UserDirectory`]
#[derive(Clone)]
pub struct Authenticator {
    directory: Arc<dyn UserDirectory>,
    encoder: PasswordEncoder,
}

impl Authenticator {
    pub fn new(directory: Arc<dyn UserDirectory>, encoder: PasswordEncoder) -> Self {
        Self { directory, encoder }
    }

    /// Resolve credentials to a principal
    ///
    /// Unknown users and wrong passwords both fail with the same
    /// `Unauthorized` error. Argon2 verification runs on the blocking pool.
    pub async fn authenticate(&self, credentials: &BasicCredentials) -> Result<Principal, Error> {
        let Some(account) = self
            .directory
            .find_by_username(&credentials.username)
            .await?
        else {
            tracing::debug!(username = %credentials.username, "Unknown user");
            return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        let encoder = self.encoder.clone();
        let raw = credentials.password.clone();
        let encoded = account.password.clone();
        let verified = tokio::task::spawn_blocking(move || encoder.matches(&raw, &encoded))
            .await
            .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?;

        match verified {
            Ok(true) => Ok(Principal::from(&account)),
            Ok(false) => {
                tracing::debug!(username = %account.username, "Password mismatch");
                Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()))
            }
            Err(e) => {
                tracing::error!(username = %account.username, error = %e, "Stored password is unusable");
                Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()))
            }
        }
    }
}
