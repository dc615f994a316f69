//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::entity::Account;
use crate::domain::value_object::{AccountId, AccountRole, Email};

// ============================================================================
// Account Summary
// ============================================================================

/// Account fields returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub role: AccountRole,
    pub verified: bool,
    /// Raw verification token, only when exposure is enabled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verification: Option<String>,
}

impl UserSummary {
    pub fn from_account(account: &Account, expose_verification: bool) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
            verified: account.verified,
            verification: expose_verification.then(|| account.verification.clone()),
        }
    }
}

// ============================================================================
// Login / Register
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Login and register response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// ============================================================================
// Verification / Reset
// ============================================================================

/// Verify request; `id` is the verification token
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub id: String,
}

/// Verify response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub email: Email,
    pub verified: bool,
}

/// Forgot password request
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Forgot password response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub msg: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verification: Option<String>,
}

/// Reset password request; `id` is the reset token
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub id: String,
    pub password: String,
}

/// `{ "msg": CODE }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Change password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
