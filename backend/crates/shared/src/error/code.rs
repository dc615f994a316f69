//! Message codes returned inside the `errors.msg` field.
//!
//! Clients match on these strings, so they are part of the public contract.

pub const USER_DOES_NOT_EXIST: &str = "USER_DOES_NOT_EXIST";
pub const EMAIL_ALREADY_EXISTS: &str = "EMAIL_ALREADY_EXISTS";
pub const WRONG_PASSWORD: &str = "WRONG_PASSWORD";
pub const BLOCKED_USER: &str = "BLOCKED_USER";
pub const NOT_FOUND_OR_ALREADY_VERIFIED: &str = "NOT_FOUND_OR_ALREADY_VERIFIED";
pub const NOT_FOUND_OR_ALREADY_USED: &str = "NOT_FOUND_OR_ALREADY_USED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const BAD_TOKEN: &str = "BAD_TOKEN";
pub const ERROR_WITH_FILTER: &str = "ERROR_WITH_FILTER";
pub const ID_MALFORMED: &str = "ID_MALFORMED";
pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

// Success messages (`{"msg": ...}`)
pub const PASSWORD_CHANGED: &str = "PASSWORD_CHANGED";
pub const RESET_EMAIL_SENT: &str = "RESET_EMAIL_SENT";
pub const DELETED: &str = "DELETED";
