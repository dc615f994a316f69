//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the login guard.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{AccessLogEntry, Account, PasswordResetRequest};
pub use repository::{
    AccessLogRepository, AccountRepository, AuthRepository, NotificationLogRepository,
    PasswordResetRepository,
};
pub use services::LoginGuard;
