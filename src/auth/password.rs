use thiserror::Error;

use super::validation::MAX_PASSWORD_BYTES;
use crate::config::MIN_BCRYPT_COST;
use crate::database::models::PasswordHash;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// bcrypt hashing on the blocking pool, so a slow hash never stalls
/// other requests on the runtime
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Costs below [`MIN_BCRYPT_COST`] are raised to it
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.max(MIN_BCRYPT_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(PasswordHash::new(hash))
    }

    /// Constant-time comparison against a stored hash. A malformed stored
    /// hash verifies as a mismatch, and so does any password longer than
    /// bcrypt's input limit (after paying for the hash all the same).
    pub async fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordError> {
        let within_limit = password.len() <= MAX_PASSWORD_BYTES;
        let password = password.to_owned();
        let hash = hash.clone();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, hash.as_str())).await?;

        match outcome {
            Ok(matches) => Ok(matches && within_limit),
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                Ok(false)
            }
        }
    }
}
