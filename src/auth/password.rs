//! Password Hashing
//! Mission: Salted, slow password digests with uniform verification cost

use anyhow::{Context, Result};
use std::sync::OnceLock;
use tracing::warn;

/// bcrypt wrapper that also owns a decoy digest, so logins for unknown
/// accounts pay the same verification cost as real ones.
#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    decoy: OnceLock<Option<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: OnceLock::new(),
        }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost).context("Failed to hash password")
    }

    /// Check `password` against a stored digest. A digest bcrypt cannot
    /// parse counts as a mismatch.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match bcrypt::verify(password, stored_hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Stored password hash is unusable: {}", e);
                false
            }
        }
    }

    /// Run a verification that can never succeed
    pub fn verify_decoy(&self, password: &str) {
        let decoy = self
            .decoy
            .get_or_init(|| bcrypt::hash("decoy-password-never-issued", self.cost).ok());
        if let Some(decoy) = decoy {
            let _ = bcrypt::verify(password, decoy);
        }
    }
}
