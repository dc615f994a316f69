//! Random tokens and encoding helpers

use base64::{Engine, engine::general_purpose};
use uuid::Uuid;

/// Generate an opaque single-use token (UUID v4, 122 random bits)
///
/// Used for email verification and password reset links.
pub fn opaque_token() -> String {
    Uuid::new_v4().to_string()
}

/// Encode bytes as URL-safe base64 without padding
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 without padding
pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}
