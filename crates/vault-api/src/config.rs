//! Server configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8000` |
//! | `STORAGE_BACKEND` | `postgres` (`memory` for a throwaway in-process store) |
//! | `DATABASE_URL` | required for `postgres` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `TOKEN_TTL_MINUTES` | `1440` |
//! | `SEARCH_MATCH_THRESHOLD` | `0.5` |
//! | `CORS_ALLOWED_ORIGINS` | any origin |

use axum::http::HeaderValue;
use tracing::warn;

use vault_core::{defaults, Error, Result};

/// Which storage collaborator the server runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Runtime configuration of the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Lifetime of issued access tokens.
    pub token_ttl_minutes: i64,
    /// Minimum cosine similarity for search results.
    pub match_threshold: f64,
    /// CORS origin whitelist; empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::PORT,
            storage: StorageBackend::default(),
            database_url: None,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            token_ttl_minutes: defaults::TOKEN_TTL_MINUTES,
            match_threshold: defaults::MATCH_THRESHOLD,
            allowed_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let base = Self::default();

        let storage = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => base.storage,
        };
        let database_url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_string(),
            ));
        }

        let match_threshold = parse_var("SEARCH_MATCH_THRESHOLD", base.match_threshold)?;
        if !(0.0..=1.0).contains(&match_threshold) {
            return Err(Error::Config(format!(
                "SEARCH_MATCH_THRESHOLD must be between 0 and 1, got {}",
                match_threshold
            )));
        }

        let token_ttl_minutes =
            check_token_ttl(parse_var("TOKEN_TTL_MINUTES", base.token_ttl_minutes)?)?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(base.host),
            port: parse_var("PORT", base.port)?,
            storage,
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", base.db_max_connections)?,
            token_ttl_minutes,
            match_threshold,
            allowed_origins: split_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
        })
    }

    /// Allowed CORS origins as header values. Invalid entries are skipped.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            })
            .collect()
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {}='{}': {}", name, raw, e))),
        _ => Ok(default),
    }
}

/// Token lifetimes must be positive and at most a year.
fn check_token_ttl(minutes: i64) -> Result<i64> {
    if !(1..=defaults::TOKEN_TTL_MINUTES_MAX).contains(&minutes) {
        return Err(Error::Config(format!(
            "TOKEN_TTL_MINUTES must be between 1 and {}, got {}",
            defaults::TOKEN_TTL_MINUTES_MAX,
            minutes
        )));
    }
    Ok(minutes)
}

/// Split a comma-separated origin list. `*` means any origin.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(str::to_string)
        .collect()
}
