//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Random tokens and Base64 helpers
//! - Token sealing (AES-256-GCM with per-message nonce)
//! - Password hashing (Argon2id)
//! - Injectable clock for time-dependent rules
//! - Client metadata extraction (IP, browser, country, bearer token)
//! - Retry with backoff and bounded timeouts for storage calls

pub mod cipher;
pub mod client;
pub mod clock;
pub mod crypto;
pub mod password;
pub mod retry;
