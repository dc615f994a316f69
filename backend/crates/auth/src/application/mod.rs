//! Application Layer
//!
//! Use cases and application services.
//!
//! Storage reads go through `retry_transient` (bounded, retried on transient
//! failure). Writes are bounded by the same timeout but never retried.

pub mod config;
pub mod forgot_password;
pub mod login;
pub mod notification;
pub mod profile;
pub mod refresh_token;
pub mod register;
pub mod reset_password;
pub mod role_authorization;
pub mod token;
pub mod verify;

// Re-exports
pub use config::{AuthConfig, AuthConfigError, Environment};
pub use forgot_password::{ForgotPasswordOutput, ForgotPasswordUseCase};
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use notification::{Delivery, EmailMessage, NotificationDispatcher, Notifier};
pub use profile::{ChangePasswordInput, ProfileUseCase};
pub use refresh_token::RefreshTokenUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use role_authorization::RoleAuthorizationUseCase;
pub use token::TokenService;
pub use verify::{VerifyOutput, VerifyUseCase};
