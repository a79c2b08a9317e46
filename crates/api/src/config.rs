use std::str::FromStr;

use axum::http::HeaderValue;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::auth::jwt::{
    JwtConfig, DEFAULT_AUDIENCE, DEFAULT_EXPIRY_MINS, DEFAULT_ISSUER, MAX_EXPIRY_MINS,
};
use crate::auth::password::{
    PasswordConfig, DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM,
};

/// Minimum accepted length of `JWT_SECRET` in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Length of the throwaway secret generated in development.
const EPHEMERAL_SECRET_LEN: usize = 64;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown APP_ENV '{0}' (expected development, test or production)")]
    UnknownEnvironment(String),

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
}

/// Server configuration loaded from environment variables.
///
/// Everything except the signing secret and the database URL has a default.
/// Outside development both of those must be supplied; there is no built-in
/// fallback secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub env: AppEnv,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. `None` selects the in-memory store (non-production only).
    pub database_url: Option<String>,
    /// Token signing configuration (secret, lifetime, issuer, audience).
    pub jwt: JwtConfig,
    /// Argon2id cost parameters.
    pub password: PasswordConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                     | Default                   |
    /// |-----------------------------|---------------------------|
    /// | `APP_ENV`                   | `production`              |
    /// | `HOST`                      | `0.0.0.0`                 |
    /// | `PORT`                      | `3000`                    |
    /// | `CORS_ORIGINS`              | `http://localhost:3000`   |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                      |
    /// | `DATABASE_URL`              | required in production    |
    /// | `JWT_SECRET`                | required outside development |
    /// | `JWT_EXPIRY_MINS`           | `1440` (at most `525600`) |
    /// | `JWT_ISSUER`                | `talent-platform`         |
    /// | `JWT_AUDIENCE`              | `talent-platform-users`   |
    /// | `PASSWORD_HASH_MEMORY_KIB`  | `19456`                   |
    /// | `PASSWORD_HASH_ITERATIONS`  | `2`                       |
    /// | `PASSWORD_HASH_PARALLELISM` | `1`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => AppEnv::Production,
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&get, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| HeaderValue::from_str(o).is_err())
        {
            return Err(ConfigError::Invalid {
                key: "CORS_ORIGINS",
                value: bad.clone(),
            });
        }

        let request_timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECS", 30u64)?;

        let database_url = get("DATABASE_URL");
        if database_url.is_none() && env == AppEnv::Production {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let secret = match (get("JWT_SECRET"), env) {
            (Some(secret), _) => {
                if secret.len() < MIN_SECRET_BYTES {
                    return Err(ConfigError::WeakSecret);
                }
                secret
            }
            (None, AppEnv::Development) => {
                tracing::warn!(
                    "JWT_SECRET not set; using an ephemeral random secret. \
                     Tokens will not survive a restart."
                );
                ephemeral_secret()
            }
            (None, _) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let expiry_mins = parse_or(&get, "JWT_EXPIRY_MINS", DEFAULT_EXPIRY_MINS)?;
        if !(0..=MAX_EXPIRY_MINS).contains(&expiry_mins) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_MINS",
                value: expiry_mins.to_string(),
            });
        }

        let jwt = JwtConfig {
            secret,
            expiry_mins,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.into()),
        };

        let password = PasswordConfig {
            memory_kib: parse_or(&get, "PASSWORD_HASH_MEMORY_KIB", DEFAULT_MEMORY_KIB)?,
            iterations: parse_or(&get, "PASSWORD_HASH_ITERATIONS", DEFAULT_ITERATIONS)?,
            parallelism: parse_or(&get, "PASSWORD_HASH_PARALLELISM", DEFAULT_PARALLELISM)?,
        };

        Ok(Self {
            env,
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
            password,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(ConfigError::Invalid { key, value: raw }),
        },
        None => Ok(default),
    }
}

fn ephemeral_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(EPHEMERAL_SECRET_LEN)
        .map(char::from)
        .collect()
}
