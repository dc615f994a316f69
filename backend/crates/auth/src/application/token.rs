//! Token Service
//!
//! Bearer tokens are HS256-signed JWTs sealed with [`TokenCipher`]: the
//! signature makes them tamper-evident and time-limited, the sealing hides the
//! subject id from the bearer. Issuing and resolving do no I/O.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use platform::cipher::TokenCipher;
use platform::clock::Clock;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::value_object::AccountId;
use crate::error::{AuthError, AuthResult};

/// Signed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Account id
    sub: String,
    /// Issued-at (UTC Unix timestamp)
    iat: i64,
    /// Expiration (UTC Unix timestamp)
    exp: i64,
    /// Unique token id
    jti: String,
}

/// Issues and resolves bearer tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cipher: TokenCipher,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> AuthResult<Self> {
        let cipher = TokenCipher::new(&config.token_encryption_key)
            .map_err(|e| AuthError::Internal(format!("Token cipher init failed: {e}")))?;

        // Expiry is checked against the injected clock, not the system time
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cipher,
            ttl: config.token_ttl,
            clock,
        })
    }

    /// Sign and seal a token for `account_id`
    pub fn issue(&self, account_id: &AccountId) -> AuthResult<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: platform::crypto::opaque_token(),
        };

        let signed = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {e}")))?;

        self.cipher
            .seal(&signed)
            .map_err(|e| AuthError::Internal(format!("Token sealing failed: {e}")))
    }

    /// Open, verify and check expiry; every failure is `BadToken`
    pub fn resolve(&self, token: &str) -> AuthResult<AccountId> {
        let signed = self.cipher.open(token)?;

        let data = decode::<Claims>(&signed, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token signature rejected");
            AuthError::BadToken
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            tracing::debug!("Token expired");
            return Err(AuthError::BadToken);
        }

        data.claims.sub.parse().map_err(|_| AuthError::BadToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use platform::clock::ManualClock;
    use platform::crypto::{from_base64url, to_base64url};

    fn service(config: &AuthConfig) -> (TokenService, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let service = TokenService::new(config, Arc::new(clock.clone())).unwrap();
        (service, clock)
    }

    #[test]
    fn test_issue_then_resolve_returns_subject() {
        let (tokens, _) = service(&AuthConfig::for_tests());
        let id = AccountId::new();
        let token = tokens.issue(&id).unwrap();
        assert_eq!(tokens.resolve(&token).unwrap(), id);
    }

    #[test]
    fn test_token_hides_subject() {
        let (tokens, _) = service(&AuthConfig::for_tests());
        let id = AccountId::new();
        let token = tokens.issue(&id).unwrap();
        assert!(!token.contains(&id.to_string()));
        // A plain JWT starts with the base64 of `{"`
        assert!(!token.starts_with("eyJ"));
    }

    #[test]
    fn test_same_subject_gives_distinct_tokens() {
        let (tokens, _) = service(&AuthConfig::for_tests());
        let id = AccountId::new();
        assert_ne!(tokens.issue(&id).unwrap(), tokens.issue(&id).unwrap());
    }

    #[test]
    fn test_expired_token_is_bad() {
        let config = AuthConfig::for_tests();
        let (tokens, clock) = service(&config);
        let token = tokens.issue(&AccountId::new()).unwrap();

        clock.advance(config.token_ttl - Duration::seconds(1));
        assert!(tokens.resolve(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(tokens.resolve(&token), Err(AuthError::BadToken)));
    }

    #[test]
    fn test_any_single_bit_flip_is_bad() {
        let (tokens, _) = service(&AuthConfig::for_tests());
        let token = tokens.issue(&AccountId::new()).unwrap();
        let mut bytes = from_base64url(&token).unwrap();

        // version, nonce length, nonce, ciphertext and tag
        for i in 0..bytes.len() {
            for bit in 0..8 {
                bytes[i] ^= 1 << bit;
                let corrupted = to_base64url(&bytes);
                assert!(
                    matches!(tokens.resolve(&corrupted), Err(AuthError::BadToken)),
                    "flip of bit {bit} in byte {i} accepted"
                );
                bytes[i] ^= 1 << bit;
            }
        }
        assert!(tokens.resolve(&to_base64url(&bytes)).is_ok());
    }

    #[test]
    fn test_token_from_other_keys_is_bad() {
        let (a, _) = service(&AuthConfig::for_tests());
        let (b, _) = service(&AuthConfig::for_tests());
        let token = a.issue(&AccountId::new()).unwrap();
        assert!(matches!(b.resolve(&token), Err(AuthError::BadToken)));
    }

    #[test]
    fn test_garbage_is_bad() {
        let (tokens, _) = service(&AuthConfig::for_tests());
        for garbage in ["", "not-a-token", "eyJhbGciOiJIUzI1NiJ9.e30.x"] {
            assert!(matches!(tokens.resolve(garbage), Err(AuthError::BadToken)));
        }
    }
}
