//! Token sealing with AES-256-GCM
//!
//! Bearer tokens are signed first and then sealed here so that the bearer
//! cannot read the subject id or claim layout. The key is derived from a
//! passphrase with HKDF-SHA256 and a fixed application salt; every message
//! gets a fresh random 96-bit nonce that travels with the ciphertext.
//!
//! Sealed layout (before base64url encoding, no padding):
//!
//! ```text
//! version (1) || nonce_len (1) || nonce (nonce_len) || ciphertext + tag
//! ```

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::{from_base64url, to_base64url};

/// Current sealed-token format version
pub const FORMAT_VERSION: u8 = 1;

/// Nonce size for AES-256-GCM (12 bytes / 96 bits)
const NONCE_SIZE: usize = 12;

/// GCM authentication tag size
const TAG_SIZE: usize = 16;

/// Fixed salt for HKDF key derivation (domain separation)
const HKDF_SALT: &[u8] = b"estate-api-token-cipher-v1";

/// HKDF context
const HKDF_INFO: &[u8] = b"bearer-token-sealing";

/// Token sealing errors
///
/// All variants collapse to `BAD_TOKEN` at the HTTP boundary; the detail is
/// only for logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("key derivation failed")]
    KeyDerivation,

    #[error("encryption failed")]
    Encryption,

    #[error("token is not valid base64url")]
    Encoding,

    #[error("unsupported token format version {0}")]
    UnsupportedVersion(u8),

    #[error("token is truncated or has an invalid nonce length")]
    Malformed,

    #[error("token authentication failed")]
    Authentication,

    #[error("decrypted token is not valid UTF-8")]
    InvalidUtf8,
}

/// Authenticated symmetric cipher for bearer tokens
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Derive the AES-256 key from `passphrase`
    pub fn new(passphrase: &str) -> Result<Self, CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), passphrase.as_bytes());
        let mut key = [0u8; 32];
        hk.expand(HKDF_INFO, &mut key)
            .map_err(|_| CipherError::KeyDerivation)?;
        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();
        Ok(Self { cipher })
    }

    /// Seal `plaintext` under a fresh random nonce
    pub fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut out = Vec::with_capacity(2 + NONCE_SIZE + ciphertext.len());
        out.push(FORMAT_VERSION);
        out.push(NONCE_SIZE as u8);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(to_base64url(&out))
    }

    /// Open a token produced by [`TokenCipher::seal`]
    pub fn open(&self, sealed: &str) -> Result<String, CipherError> {
        let bytes = from_base64url(sealed).map_err(|_| CipherError::Encoding)?;

        let (&version, rest) = bytes.split_first().ok_or(CipherError::Malformed)?;
        if version != FORMAT_VERSION {
            return Err(CipherError::UnsupportedVersion(version));
        }
        let (&nonce_len, rest) = rest.split_first().ok_or(CipherError::Malformed)?;
        if nonce_len as usize != NONCE_SIZE || rest.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Malformed);
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").field("key", &"[REDACTED]").finish()
    }
}
