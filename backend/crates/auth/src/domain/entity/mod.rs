//! Entities

pub mod access_log;
pub mod account;
pub mod notification;
pub mod password_reset;

pub use access_log::AccessLogEntry;
pub use account::{Account, NewAccount, ProfileUpdate};
pub use notification::{DeliveryStatus, NotificationChannel, NotificationLogEntry};
pub use password_reset::PasswordResetRequest;
