// Password hashing and validation service

use crate::auth::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::OnceLock;

const DUMMY_PASSWORD: &str = "no-such-account";

/// Password service for hashing and verification (Argon2id, PHC strings)
#[derive(Clone)]
pub struct PasswordService {
    hasher: Argon2<'static>,
    /// Hash checked when a login names no account, built on first use
    dummy_hash: OnceLock<String>,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self {
            hasher: Argon2::default(),
            dummy_hash: OnceLock::new(),
        }
    }
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a service with explicit Argon2id cost parameters
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuthError::ConfigError(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored hash
    /// The cost parameters are read from the hash itself
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Failed to parse stored password hash: {:?}", e);
            AuthError::PasswordHashError
        })?;

        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spends one full verification on a throwaway hash with this service's cost
    ///
    /// Called when there is no stored hash, so an unknown username costs as much
    /// as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => match self.hash_password(DUMMY_PASSWORD) {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash),
                Err(_) => return,
            },
        };
        let _ = self.verify_password(password, hash);
    }

    #[cfg(test)]
    pub(crate) fn dummy_hash_ready(&self) -> bool {
        self.dummy_hash.get().is_some()
    }
}
