//! `/users` admin resource
//!
//! Accounts exposed through the generic CRUD contract. Passwords are hashed
//! before they reach the store and never returned.

use auth::models::{AccountRole, AccountStatus, Email};
use platform::password::{ClearTextPassword, PasswordCost};
use query::domain::entity::{Attributes, CREATED_AT, ID, UPDATED_AT, WriteMode};
use query::{Entity, Field, FieldKind, QueryError, QueryResult};
use serde_json::Value;

/// Unique index on `lower(email)`
const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";

pub struct UserResource {
    cost: PasswordCost,
}

impl UserResource {
    pub fn new(cost: PasswordCost) -> Self {
        Self { cost }
    }
}

fn text<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(Value::as_str)
}

impl Entity for UserResource {
    const NAME: &'static str = "user";
    const TABLE: &'static str = "users";
    const FIELDS: &'static [Field] = &[
        ID,
        Field::new("name", "name", FieldKind::Text).required(),
        Field::new("email", "email", FieldKind::Text)
            .required()
            .unique(EMAIL_UNIQUE_INDEX),
        Field::new("phone", "phone", FieldKind::Text).required(),
        Field::new("password", "password", FieldKind::Text)
            .required()
            .write_only(),
        Field::new("role", "role", FieldKind::Text),
        Field::new("status", "status", FieldKind::Text),
        Field::new("verified", "verified", FieldKind::Boolean),
        Field::new("loginAttempts", "login_attempts", FieldKind::Integer).read_only(),
        Field::new("blockExpires", "block_expires", FieldKind::Timestamp).read_only(),
        CREATED_AT,
        UPDATED_AT,
    ];

    fn prepare(&self, attrs: &mut Attributes, _mode: WriteMode) -> QueryResult<()> {
        if let Some(raw) = text(attrs, "email") {
            let email = Email::new(raw).map_err(|e| QueryError::Validation(e.message_code()))?;
            attrs.insert("email".into(), Value::String(email.as_str().to_string()));
        }

        if let Some(role) = text(attrs, "role") {
            if AccountRole::from_code(role).is_none() {
                return Err(QueryError::Validation("ROLE_IS_NOT_VALID".into()));
            }
        }

        if let Some(status) = text(attrs, "status") {
            if AccountStatus::from_code(status).is_none() {
                return Err(QueryError::Validation("STATUS_IS_NOT_VALID".into()));
            }
        }

        if let Some(raw) = text(attrs, "password") {
            let password = ClearTextPassword::new(raw.to_string())
                .map_err(|e| QueryError::Validation(e.to_string()))?;
            let hashed = password
                .hash(&self.cost)
                .map_err(|e| QueryError::Internal(e.to_string()))?;
            attrs.insert(
                "password".into(),
                Value::String(hashed.as_phc_string().to_string()),
            );
        }

        Ok(())
    }

    fn constraint_message(&self, constraint: &str) -> Option<&'static str> {
        (constraint == EMAIL_UNIQUE_INDEX).then_some(kernel::error::code::EMAIL_ALREADY_EXISTS)
    }
}
