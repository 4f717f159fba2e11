//! Application Configuration
//! Mission: Load runtime configuration once and pass it explicitly

use anyhow::{Context, Result};
use std::env;

/// One hour, the bounded-staleness window for cached roles/profiles.
pub const CACHE_TTL_MS: u64 = 3_600_000;
/// Default expiry for cache writes that do not specify a TTL.
pub const ONE_MONTH_MS: u64 = 30 * 24 * 60 * 60 * 1000;
/// Access tokens live for three hours.
pub const ACCESS_TOKEN_HOURS: i64 = 3;
/// Refresh tokens live for one day.
pub const REFRESH_TOKEN_HOURS: i64 = 24;

/// Runtime configuration, built once in `main` from the environment and
/// injected into services at construction time. No ambient lookups after
/// startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: String,
    pub secret_key: String,
    pub cache_namespace: String,
}

impl AppConfig {
    /// Read configuration from environment variables.
    ///
    /// `SECRET_KEY` is mandatory; everything else has a sane default.
    pub fn from_env() -> Result<Self> {
        let secret_key = env::var("SECRET_KEY").context("SECRET_KEY must be set")?;

        Ok(Self {
            bind_addr: env::var("MIMS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            db_path: env::var("MIMS_DB_PATH").unwrap_or_else(|_| "mims.db".to_string()),
            secret_key,
            cache_namespace: env::var("MIMS_CACHE_PREFIX").unwrap_or_else(|_| "mims".to_string()),
        })
    }

    /// Fixed configuration for tests: throwaway database path, known secret.
    pub fn for_tests(db_path: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            db_path: db_path.to_string(),
            secret_key: "test-secret-key-12345".to_string(),
            cache_namespace: "mims-test".to_string(),
        }
    }
}
