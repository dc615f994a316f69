//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, login guard
//! - `application/` - Use cases, token service, notifications
//! - `infra/` - PostgreSQL / in-memory repositories, mailers
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Register / login with email + password
//! - Email verification and password reset with single-use tokens
//! - Bearer tokens (signed JWT sealed with AES-256-GCM) and refresh
//! - Role-based access (User, Admin)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Accounts blocked for 2 hours after more than 5 consecutive failures
//! - Token secrets injected through [`AuthConfig`], never read globally
//! - Verification tokens echoed only when explicitly enabled outside production

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthConfig, AuthConfigError, Environment};
pub use application::token::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::mailer::Mailer;
pub use infra::memory::InMemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use presentation::handlers::AuthAppState;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
