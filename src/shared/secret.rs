//! Secret key hashing
//!
//! Users bind their identity with a login and a secret key. Only an Argon2id
//! hash of the key is stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::error::AppError;
use crate::config::SecuritySettings;

/// Hashes and verifies secret keys.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Build a hasher with the configured cost.
    pub fn new(settings: &SecuritySettings) -> Result<Self, AppError> {
        let params = Params::new(settings.hash_memory_kib, settings.hash_iterations, 1, None)
            .map_err(|e| AppError::Internal(format!("Invalid hashing parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret key with a fresh salt
    pub fn hash(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Secret hashing failed: {}", e)))
    }

    /// Verify a secret key against its stored hash
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid secret hash: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}
