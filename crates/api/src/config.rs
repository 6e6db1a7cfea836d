//! Server configuration.

use std::fmt::Debug;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Runtime configuration for the HTTP server, read once at startup.
///
/// Defaults suit local development; deployments override via environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, comma-separated in `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum database connections (default: `10`).
    pub db_max_connections: u32,
    /// JWT signing secret and token lifetimes.
    pub jwt: JwtConfig,
}

/// Read an environment variable, falling back to `default` when unset.
///
/// # Panics
///
/// Panics when the variable is set but does not parse, so a typo in the
/// deployment environment fails at startup instead of mid-request.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    <T as FromStr>::Err: Debug,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not a valid value: {e:?}")),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `DB_MAX_CONNECTIONS`   | `10`                    |
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            jwt: JwtConfig::from_env(),
        }
    }
}
