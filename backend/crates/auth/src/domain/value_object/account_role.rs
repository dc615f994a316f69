use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    User,
    Admin,
}

impl AccountRole {
    pub const ALL: [AccountRole; 2] = [AccountRole::User, AccountRole::Admin];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Admin => "admin",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(AccountRole::User),
            "admin" => Some(AccountRole::Admin),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AccountRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| AuthError::Validation("USER_NOT_IN_KNOWN_ROLE".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_role_from_code() {
        assert_eq!(AccountRole::from_code("user"), Some(AccountRole::User));
        assert_eq!(AccountRole::from_code("admin"), Some(AccountRole::Admin));
        assert_eq!(AccountRole::from_code("super_admin"), None);
    }

    #[test]
    fn test_account_role_display() {
        assert_eq!(AccountRole::User.to_string(), "user");
        assert_eq!(AccountRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_default_is_user() {
        assert_eq!(AccountRole::default(), AccountRole::User);
        assert!(!AccountRole::User.is_admin());
        assert!(AccountRole::Admin.is_admin());
    }

    #[test]
    fn test_unknown_role_is_validation_error() {
        let err = "landlord".parse::<AccountRole>().unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }
}
