//! Application Configuration
//!
//! Configuration for the Auth application layer. Secrets are carried here and
//! injected into the token service at construction; nothing reads them from
//! the environment after startup.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use platform::password::PasswordCost;
use platform::retry::RetryPolicy;
use thiserror::Error;

/// Default failed-login threshold
pub const LOGIN_ATTEMPTS_THRESHOLD: i32 = 5;

/// Default block window in hours
pub const BLOCK_DURATION_HOURS: i64 = 2;

/// Default token lifetime (3 days)
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 4320;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = AuthConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => Err(AuthConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Configuration rejected at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthConfigError {
    #[error("unknown environment '{0}'")]
    UnknownEnvironment(String),

    #[error("{0} must not be empty")]
    EmptySecret(&'static str),

    #[error("JWT_SECRET and TOKEN_ENCRYPTION_KEY must differ")]
    SharedSecret,

    #[error("verification tokens must never be exposed in production")]
    ExposedInProduction,

    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Passphrase the token cipher key is derived from
    pub token_encryption_key: String,
    /// Bearer token lifetime
    pub token_ttl: Duration,
    /// Failed attempts tolerated before blocking
    pub login_attempts_threshold: i32,
    /// Block window length
    pub block_duration: Duration,
    pub environment: Environment,
    /// Echo verification tokens in responses (development/test only)
    pub expose_verification_tokens: bool,
    /// Base URL used in verification and reset links
    pub frontend_url: String,
    /// Argon2 parameters for new hashes
    pub password_cost: PasswordCost,
    /// Timeout and retry policy for storage calls
    pub storage_retry: RetryPolicy,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_encryption_key", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("login_attempts_threshold", &self.login_attempts_threshold)
            .field("block_duration", &self.block_duration)
            .field("environment", &self.environment)
            .field("expose_verification_tokens", &self.expose_verification_tokens)
            .field("frontend_url", &self.frontend_url)
            .finish()
    }
}

impl AuthConfig {
    /// Config with the given secrets and every other field at its default
    pub fn new(jwt_secret: impl Into<String>, token_encryption_key: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_encryption_key: token_encryption_key.into(),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            login_attempts_threshold: LOGIN_ATTEMPTS_THRESHOLD,
            block_duration: Duration::hours(BLOCK_DURATION_HOURS),
            environment: Environment::default(),
            expose_verification_tokens: false,
            frontend_url: "http://localhost:8080".to_string(),
            password_cost: PasswordCost::default(),
            storage_retry: RetryPolicy::default(),
        }
    }

    /// Isolated random secrets, cheap hashing, tokens exposed
    pub fn for_tests() -> Self {
        Self {
            environment: Environment::Test,
            expose_verification_tokens: true,
            password_cost: PasswordCost::minimal(),
            ..Self::new(platform::crypto::opaque_token(), platform::crypto::opaque_token())
        }
    }

    /// Reject unsafe combinations before the server starts
    pub fn validate(&self) -> Result<(), AuthConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(AuthConfigError::EmptySecret("JWT_SECRET"));
        }
        if self.token_encryption_key.is_empty() {
            return Err(AuthConfigError::EmptySecret("TOKEN_ENCRYPTION_KEY"));
        }
        if self.jwt_secret == self.token_encryption_key {
            return Err(AuthConfigError::SharedSecret);
        }
        if self.environment.is_production() && self.expose_verification_tokens {
            return Err(AuthConfigError::ExposedInProduction);
        }
        if self.token_ttl <= Duration::zero() {
            return Err(AuthConfigError::NonPositive("JWT_EXPIRATION_IN_MINUTES"));
        }
        if self.block_duration <= Duration::zero() {
            return Err(AuthConfigError::NonPositive("block_duration"));
        }
        Ok(())
    }

    /// Whether responses may carry raw verification tokens
    pub fn exposes_verification(&self) -> bool {
        self.expose_verification_tokens && !self.environment.is_production()
    }

    /// Link for the registration email
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify/{}", self.frontend_url.trim_end_matches('/'), token)
    }

    /// Link for the password reset email
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset/{}", self.frontend_url.trim_end_matches('/'), token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_guard_constants() {
        let config = AuthConfig::new("a", "b");
        assert_eq!(config.login_attempts_threshold, 5);
        assert_eq!(config.block_duration, Duration::hours(2));
        assert_eq!(config.token_ttl, Duration::minutes(4320));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_never_exposes_tokens() {
        let mut config = AuthConfig::new("a", "b");
        config.environment = Environment::Production;
        config.expose_verification_tokens = true;
        assert_eq!(config.validate(), Err(AuthConfigError::ExposedInProduction));
        assert!(!config.exposes_verification());
    }

    #[test]
    fn test_secrets_must_be_distinct_and_present() {
        assert_eq!(
            AuthConfig::new("same", "same").validate(),
            Err(AuthConfigError::SharedSecret)
        );
        assert_eq!(
            AuthConfig::new("", "b").validate(),
            Err(AuthConfigError::EmptySecret("JWT_SECRET"))
        );
    }

    #[test]
    fn test_test_configs_are_isolated() {
        let a = AuthConfig::for_tests();
        let b = AuthConfig::for_tests();
        assert_ne!(a.jwt_secret, b.jwt_secret);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_links_ignore_trailing_slash() {
        let mut config = AuthConfig::new("a", "b");
        config.frontend_url = "https://app.example.com/".into();
        assert_eq!(config.verification_link("t1"), "https://app.example.com/verify/t1");
        assert_eq!(config.reset_link("t2"), "https://app.example.com/reset/t2");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("PRODUCTION".parse(), Ok(Environment::Production));
        assert_eq!("test".parse(), Ok(Environment::Test));
        assert!("staging".parse::<Environment>().is_err());
    }
}
