//! Resource schema
//!
//! An [`Entity`] describes one table: which API fields exist, the column
//! each maps to, and which of them may be read, written or filtered.
//! Documents travel as JSON objects keyed by API field name.

use chrono::DateTime;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};

/// A stored row, keyed by API field name
pub type Document = Map<String, Value>;

/// Client-supplied attributes for create/update, keyed by API field name
pub type Attributes = Map<String, Value>;

/// JSON shape accepted for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 string
    Timestamp,
    Uuid,
}

impl FieldKind {
    /// Whether a non-null JSON value fits this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Timestamp => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            FieldKind::Uuid => value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Returned, never written by clients (ids, timestamps)
    ReadOnly,
    ReadWrite,
    /// Written, never returned (password hashes)
    WriteOnly,
}

/// One API field of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// camelCase name used in JSON and query strings
    pub name: &'static str,
    /// snake_case column name
    pub column: &'static str,
    pub kind: FieldKind,
    pub access: Access,
    /// Must be present (and non-empty) on create
    pub required: bool,
    /// Name of the unique constraint guarding this field, compared case-insensitively
    pub unique: Option<&'static str>,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            access: Access::ReadWrite,
            required: false,
            unique: None,
        }
    }

    pub const fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    pub const fn write_only(mut self) -> Self {
        self.access = Access::WriteOnly;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self, constraint: &'static str) -> Self {
        self.unique = Some(constraint);
        self
    }

    pub fn is_readable(&self) -> bool {
        self.access != Access::WriteOnly
    }

    pub fn is_writable(&self) -> bool {
        self.access != Access::ReadOnly
    }

    /// `blockExpires` -> `BLOCK_EXPIRES`, the prefix of validation messages
    pub fn message_prefix(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 4);
        for (i, ch) in self.name.chars().enumerate() {
            if ch.is_uppercase() && i > 0 {
                out.push('_');
            }
            out.extend(ch.to_uppercase());
        }
        out
    }
}

/// Fields every table carries
pub const ID: Field = Field::new("id", "id", FieldKind::Uuid).read_only();
pub const CREATED_AT: Field = Field::new("createdAt", "created_at", FieldKind::Timestamp).read_only();
pub const UPDATED_AT: Field = Field::new("updatedAt", "updated_at", FieldKind::Timestamp).read_only();

/// Whether attributes are being validated for an insert or a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A resource exposed through the generic CRUD contract
///
/// `FIELDS` must include [`ID`], [`CREATED_AT`] and [`UPDATED_AT`].
pub trait Entity: Send + Sync + 'static {
    /// Resource name used in logs
    const NAME: &'static str;
    const TABLE: &'static str;
    const FIELDS: &'static [Field];

    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    fn readable_fields() -> impl Iterator<Item = &'static Field> {
        Self::FIELDS.iter().filter(|f| f.is_readable())
    }

    /// Last hook before attributes reach the store (hashing, normalisation)
    fn prepare(&self, _attrs: &mut Attributes, _mode: WriteMode) -> QueryResult<()> {
        Ok(())
    }

    /// Client message for a violated constraint; `None` keeps the constraint name
    fn constraint_message(&self, _constraint: &str) -> Option<&'static str> {
        None
    }
}

/// Check client attributes against the entity schema
///
/// Strings are trimmed. Unknown or read-only fields, wrong JSON types and
/// missing required fields are rejected with a field-specific message.
pub fn validate_attributes<E: Entity>(attrs: Attributes, mode: WriteMode) -> QueryResult<Attributes> {
    let mut out = Attributes::new();

    for (name, value) in attrs {
        let field = E::field(&name)
            .filter(|f| f.is_writable())
            .ok_or_else(|| QueryError::Validation(format!("{}_IS_NOT_ALLOWED", name.to_uppercase())))?;

        let value = match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        };

        let empty = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty() && field.kind == FieldKind::Text,
            _ => false,
        };
        if empty {
            if field.required {
                return Err(QueryError::Validation(format!("{}_IS_EMPTY", field.message_prefix())));
            }
            if value.is_null() {
                out.insert(name, value);
                continue;
            }
        }

        if !field.kind.accepts(&value) {
            return Err(QueryError::Validation(format!(
                "{}_IS_NOT_VALID",
                field.message_prefix()
            )));
        }
        out.insert(name, value);
    }

    if mode == WriteMode::Create {
        if let Some(missing) = E::FIELDS
            .iter()
            .find(|f| f.required && !out.contains_key(f.name))
        {
            return Err(QueryError::Validation(format!("{}_IS_EMPTY", missing.message_prefix())));
        }
    }

    Ok(out)
}

/// Parse a path id
pub fn parse_id(raw: &str) -> QueryResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| QueryError::Validation(kernel::error::code::ID_MALFORMED.to_string()))
}
