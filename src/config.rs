// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Everything is read once
//! at startup and shared read-only through `AppState`.

use std::env;

/// Signing key used when `JWT_SECRET` is not configured outside production.
const FALLBACK_JWT_SECRET: &str = "quizgate-insecure-development-secret";

const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted `JWT_EXPIRES_IN`.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Deployment environment. Controls cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Which persistence backend the credential store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Firestore,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    pub environment: Environment,
    /// HS256 signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session token lifetime, also used as the cookie max age
    pub token_ttl_secs: u64,
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Upper bound on any single store call
    pub store_timeout_ms: u64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Bootstrap admin credentials, created at startup if missing
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Optional JSON question bank loaded at startup
    pub questions_file: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Development,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            store_timeout_ms: 5_000,
            // bcrypt's minimum cost keeps tests fast
            bcrypt_cost: 4,
            admin_username: None,
            admin_password: None,
            questions_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref().map(str::trim) {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_signing_key = match lookup("JWT_SECRET").map(|v| v.trim().to_string()) {
            Some(secret) if !secret.is_empty() => secret.into_bytes(),
            _ if environment == Environment::Production => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            _ => {
                tracing::warn!("JWT_SECRET not set, signing session tokens with the built-in fallback key");
                FALLBACK_JWT_SECRET.as_bytes().to_vec()
            }
        };

        let token_ttl_secs = match lookup("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration_secs(&raw)
                .filter(|secs| *secs <= MAX_TOKEN_TTL_SECS)
                .ok_or(ConfigError::Invalid("JWT_EXPIRES_IN", raw))?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("firestore") => StoreBackend::Firestore,
            Some(other) => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        let bcrypt_cost = lookup("BCRYPT_COST")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(10u32);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST", bcrypt_cost.to_string()));
        }

        Ok(Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            environment,
            jwt_signing_key,
            token_ttl_secs,
            store_backend,
            gcp_project_id: lookup("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            store_timeout_ms: lookup("STORE_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5_000),
            bcrypt_cost,
            admin_username: non_empty(lookup("ADMIN_USERNAME")),
            admin_password: non_empty(lookup("ADMIN_PASSWORD")),
            questions_file: non_empty(lookup("QUESTIONS_FILE")),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a lifetime such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    value.checked_mul(multiplier).filter(|secs| *secs > 0)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.jwt_signing_key, FALLBACK_JWT_SECRET.as_bytes());
        assert!(!config.is_production());
    }

    #[test]
    fn test_config_from_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod_secret_value"),
            ("JWT_EXPIRES_IN", "12h"),
            ("STORE_BACKEND", "firestore"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "  "),
        ]))
        .expect("Config should load");

        assert_eq!(config.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.jwt_signing_key, b"prod_secret_value");
        assert_eq!(config.token_ttl_secs, 12 * 60 * 60);
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert_eq!(config.admin_username.as_deref(), Some("root"));
        assert_eq!(config.admin_password, None);
    }

    #[test]
    fn test_production_requires_secret() {
        let err = Config::from_lookup(lookup_from(&[("APP_ENV", "production")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let err = Config::from_lookup(lookup_from(&[("STORE_BACKEND", "mongo")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("STORE_BACKEND", _)));
    }

    #[test]
    fn test_rejects_oversized_token_lifetime() {
        for raw in ["366d", "18446744073709551615", "99999999999999d"] {
            let err = Config::from_lookup(lookup_from(&[("JWT_EXPIRES_IN", raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid("JWT_EXPIRES_IN", _)), "{raw}");
        }

        let config = Config::from_lookup(lookup_from(&[("JWT_EXPIRES_IN", "365d")])).unwrap();
        assert_eq!(config.token_ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("7d"), Some(604_800));
        assert_eq!(parse_duration_secs("3600"), Some(3600));
        assert_eq!(parse_duration_secs("15m"), Some(900));
        assert_eq!(parse_duration_secs("0"), None);
        assert_eq!(parse_duration_secs("d"), None);
        assert_eq!(parse_duration_secs("5w"), None);
    }
}
