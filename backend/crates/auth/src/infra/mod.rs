//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mailer;
pub mod memory;
pub mod postgres;

pub use mailer::{LogNotifier, Mailer, MemoryNotifier, SmtpConfig, SmtpNotifier};
pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
