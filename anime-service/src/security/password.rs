//! Password encoding in delegating format
//!
//! Stored passwords carry an `{id}` prefix naming their encoding:
//!
//! - `{argon2}$argon2id$v=19$...`: Argon2 PHC string
//! - `$argon2id$v=19$...`: bare Argon2 PHC string
//! - `{noop}secret`: plaintext, for development only
//!
//! # Example
//!
//! ```rust,ignore
//! use anime_service::security::PasswordEncoder;
//!
//! let encoder = PasswordEncoder::default();
//! let encoded = encoder.encode("academy")?;
//! assert!(encoder.matches("academy", &encoded)?);
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::config::PasswordConfig;
use crate::error::Error;

const ARGON2_ID: &str = "{argon2}";
const NOOP_ID: &str = "{noop}";

/// Encoder and verifier for delegating-format passwords
#[derive(Clone, Default)]
pub struct PasswordEncoder {
    params: Params,
}

impl PasswordEncoder {
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| Error::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    /// Hash a password with Argon2id, returning `{argon2}<PHC string>`
    pub fn encode(&self, raw: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(format!("{}{}", ARGON2_ID, hash))
    }

    /// Check a raw password against an encoded one
    ///
    /// Unknown encodings never match. Malformed Argon2 hashes are errors.
    pub fn matches(&self, raw: &str, encoded: &str) -> Result<bool, Error> {
        if let Some(plain) = encoded.strip_prefix(NOOP_ID) {
            return Ok(plain == raw);
        }

        let phc = match encoded.strip_prefix(ARGON2_ID) {
            Some(phc) => phc,
            None if encoded.starts_with("$argon2") => encoded,
            None => {
                tracing::warn!("Stored password has an unsupported encoding");
                return Ok(false);
            }
        };

        let parsed = PasswordHash::new(phc)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read from the hash.
        match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// Whether an encoded password is stored as plaintext
    pub fn is_plaintext(encoded: &str) -> bool {
        encoded.starts_with(NOOP_ID)
    }
}
