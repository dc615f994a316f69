//! Value Object Module

pub mod account_role;
pub mod account_status;
pub mod email;

pub use account_role::AccountRole;
pub use account_status::AccountStatus;
pub use email::Email;
pub use kernel::id::{AccessLogId, AccountId, NotificationId, PasswordResetId};
