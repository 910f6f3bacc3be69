//! Password digests.
//!
//! Argon2 is CPU-bound, so both directions run on the blocking pool.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};
use async_trait::async_trait;
use tokio::task;

use crate::config::SecurityConfig;

#[async_trait]
pub trait Hasher: Send + Sync {
    async fn hash(&self, plain: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only for unreadable digests.
    async fn verify(&self, plain: &str, digest: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct Argon2Hasher {
    config: SecurityConfig,
}

impl Argon2Hasher {
    #[must_use]
    pub const fn new(config: SecurityConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Hasher for Argon2Hasher {
    async fn hash(&self, plain: &str) -> Result<String> {
        let password = plain.to_string();
        let config = self.config.clone();

        task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")?
    }

    async fn verify(&self, plain: &str, digest: &str) -> Result<bool> {
        let password = plain.to_string();
        let digest = digest.to_string();

        task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&digest)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            // Parameters are read from the digest itself.
            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")?
    }
}

fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
