//! Server configuration
//!
//! Read once at startup from the process environment (after `.env` is
//! loaded). Secrets end up in [`AuthConfig`] and are injected from there.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, Environment};
use platform::retry::RetryPolicy;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Pool acquire and statement timeout
    pub database_timeout: Duration,
    pub bind_addr: SocketAddr,
    /// Origins allowed by CORS
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{key} must be set"));

        let database_url = require("DATABASE_URL")?;
        let database_max_connections = parse_or(
            get("DATABASE_MAX_CONNECTIONS"),
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let timeout_secs = parse_or(
            get("DATABASE_TIMEOUT_SECS"),
            "DATABASE_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            bail!("DATABASE_TIMEOUT_SECS must be positive");
        }
        let database_timeout = Duration::from_secs(timeout_secs);

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse::<Environment>()?,
            None => Environment::default(),
        };

        let frontend_url = get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| frontend_url.clone())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let mut auth = AuthConfig::new(require("JWT_SECRET")?, require("TOKEN_ENCRYPTION_KEY")?);
        auth.environment = environment;
        auth.frontend_url = frontend_url;
        auth.expose_verification_tokens = parse_or(
            get("EXPOSE_VERIFICATION_TOKENS"),
            "EXPOSE_VERIFICATION_TOKENS",
            false,
        )?;
        if let Some(minutes) = get("JWT_EXPIRATION_IN_MINUTES") {
            let minutes: i64 = minutes
                .trim()
                .parse()
                .context("JWT_EXPIRATION_IN_MINUTES must be an integer")?;
            auth.token_ttl = chrono::Duration::minutes(minutes);
        }
        auth.storage_retry = RetryPolicy {
            timeout: database_timeout,
            ..RetryPolicy::default()
        };
        auth.validate()?;

        Ok(Self {
            database_url,
            database_max_connections,
            database_timeout,
            bind_addr,
            frontend_origins,
            auth,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/maskani"),
        ("JWT_SECRET", "jwt-secret"),
        ("TOKEN_ENCRYPTION_KEY", "cipher-key"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = BASE.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.database_timeout, Duration::from_secs(5));
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.frontend_origins, ["http://localhost:8080"]);
        assert_eq!(config.auth.environment, Environment::Development);
        assert_eq!(config.auth.token_ttl, chrono::Duration::minutes(4320));
        assert!(!config.auth.expose_verification_tokens);
        assert_eq!(config.auth.storage_retry.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let pairs = with(&[
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DATABASE_TIMEOUT_SECS", "2"),
            ("JWT_EXPIRATION_IN_MINUTES", "60"),
            ("APP_ENV", "test"),
            ("EXPOSE_VERIFICATION_TOKENS", "true"),
            ("FRONTEND_URL", "https://app.maskani.example/"),
            ("BIND_ADDR", "127.0.0.1:8000"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.auth.token_ttl, chrono::Duration::minutes(60));
        assert!(config.auth.exposes_verification());
        assert_eq!(config.frontend_origins, ["https://app.maskani.example"]);
        assert_eq!(
            config.auth.verification_link("t"),
            "https://app.maskani.example/verify/t"
        );
    }

    #[test]
    fn test_missing_secrets_are_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_exposure_refused_in_production() {
        let pairs = with(&[("APP_ENV", "production"), ("EXPOSE_VERIFICATION_TOKENS", "true")]);
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_shared_secret_refused() {
        let pairs = [
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "same"),
            ("TOKEN_ENCRYPTION_KEY", "same"),
        ];
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(AppConfig::from_lookup(lookup(&with(&[("DATABASE_MAX_CONNECTIONS", "many")]))).is_err());
        assert!(AppConfig::from_lookup(lookup(&with(&[("APP_ENV", "staging")]))).is_err());
        assert!(AppConfig::from_lookup(lookup(&with(&[("DATABASE_TIMEOUT_SECS", "0")]))).is_err());
    }
}
