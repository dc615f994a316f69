//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types, message codes and result aliases
//! - Typed ID wrappers shared by every bounded context
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod code;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
