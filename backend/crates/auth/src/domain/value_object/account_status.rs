//! Account Status Value Object
//!
//! - **Active**: normal account
//! - **Pending**: created by an administrator, not yet in use
//! - **Deleted**: soft-deleted; behaves as if the account does not exist
//!
//! Rows are never hard-deleted by the account core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Pending,
    Deleted,
}

impl AccountStatus {
    /// Get string code for storage/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Deleted => "deleted",
        }
    }

    /// Soft-deleted accounts are invisible to authentication
    #[inline]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
