//! Password hashing and verification.
//!
//! Passwords are stored as argon2id PHC strings with a random 16-byte salt,
//! so each hash is self-describing and verification needs no side channel.
//! Verification is deliberately infallible: a malformed stored hash verifies
//! as `false`, the same as a wrong password.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};

/// Hashes and verifies passwords with a fixed argon2id configuration.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a service with the argon2id default work factor.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create a service with an explicit work factor (memory in KiB,
    /// iterations, parallelism). Tests use this to keep hashing fast.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, argon2::Error> {
        let params = Params::new(m_cost, t_cost, p_cost, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(PasswordError::Rng)?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordError::Hash)?;

        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::Hash)?
            .to_string();
        Ok(phc)
    }

    /// Check a password against a stored PHC string. Returns `false` for a
    /// wrong password and for a hash that does not parse.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur while hashing a password.
#[derive(Debug)]
pub enum PasswordError {
    /// The system random source failed
    Rng(getrandom::Error),
    /// The hashing primitive rejected its input
    Hash(password_hash::Error),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Rng(e) => write!(f, "Failed to generate salt: {}", e),
            PasswordError::Hash(e) => write!(f, "Failed to hash password: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}
