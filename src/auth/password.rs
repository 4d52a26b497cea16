//! Password hashing and verification (Argon2id, PHC strings).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password verification failed: {0}")]
    Verify(String),
}

/// One-way password hasher. Every call to `hash` uses a fresh random salt, so
/// the same plaintext never produces the same hash string twice.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password into a self-describing PHC string
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify `plaintext` against a stored hash.
    ///
    /// A hash string that cannot be parsed is treated as a non-match rather
    /// than an error. Only failures inside the hashing primitive surface as
    /// `Err`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return Ok(false);
            }
        };

        use argon2::password_hash::Error;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(e @ Error::Crypto) | Err(e @ Error::OutputSize { .. }) => {
                Err(PasswordError::Verify(e.to_string()))
            }
            // Mismatch, or an algorithm/parameter set this hasher cannot use
            Err(_) => Ok(false),
        }
    }
}

/// Registration-time password rules. Non-empty is always required; the rest
/// is configured per environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: None,
            require_digit: false,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Result<(), String> {
        let length = password.chars().count();

        if length == 0 {
            return Err("Password cannot be empty".to_string());
        }
        if length < self.min_length {
            return Err(format!("Password must be at least {} characters", self.min_length));
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(format!("Password must be at most {} characters", max));
            }
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one digit".to_string());
        }

        Ok(())
    }
}
