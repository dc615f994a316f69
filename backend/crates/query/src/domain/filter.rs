//! Filter translation
//!
//! `?filter=<text>&fields=a,b` becomes a case-insensitive substring match
//! on any of the named fields. Without both parameters every row matches.

use serde::Deserialize;

use crate::domain::entity::{Entity, Field};
use crate::error::{QueryError, QueryResult};

/// Raw list query string
///
/// Every value is kept as text so malformed numbers can fall back to
/// their defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub fields: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    MatchAll,
    /// `needle` occurs (ignoring case) in at least one of `fields`
    AnyContains {
        needle: String,
        fields: Vec<&'static Field>,
    },
}

impl Predicate {
    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }
}

/// Build the predicate for `query`
pub fn parse_filter<E: Entity>(query: &ListQuery) -> QueryResult<Predicate> {
    let (Some(filter), Some(fields)) = (&query.filter, &query.fields) else {
        return Ok(Predicate::MatchAll);
    };

    let mut resolved: Vec<&'static Field> = Vec::new();
    for name in fields.split(',').map(str::trim) {
        if name.is_empty() {
            return Err(QueryError::Filter(format!("empty entry in fields `{fields}`")));
        }
        let field = E::field(name)
            .filter(|f| f.is_readable())
            .ok_or_else(|| QueryError::Filter(format!("unknown field `{name}` on {}", E::NAME)))?;
        if !resolved.contains(&field) {
            resolved.push(field);
        }
    }

    Ok(Predicate::AnyContains {
        needle: filter.clone(),
        fields: resolved,
    })
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern
pub fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{CREATED_AT, FieldKind, ID, UPDATED_AT};

    struct Tenant;

    impl Entity for Tenant {
        const NAME: &'static str = "tenant";
        const TABLE: &'static str = "tenants";
        const FIELDS: &'static [Field] = &[
            ID,
            Field::new("name", "name", FieldKind::Text),
            Field::new("email", "email", FieldKind::Text),
            Field::new("pin", "pin", FieldKind::Text).write_only(),
            CREATED_AT,
            UPDATED_AT,
        ];
    }

    fn query(filter: Option<&str>, fields: Option<&str>) -> ListQuery {
        ListQuery {
            filter: filter.map(String::from),
            fields: fields.map(String::from),
            ..ListQuery::default()
        }
    }

    #[test]
    fn test_filter_and_fields_build_or_predicate() {
        let p = parse_filter::<Tenant>(&query(Some("Ann"), Some("name, email"))).unwrap();
        match p {
            Predicate::AnyContains { needle, fields } => {
                assert_eq!(needle, "Ann");
                let names: Vec<_> = fields.iter().map(|f| f.column).collect();
                assert_eq!(names, ["name", "email"]);
            }
            Predicate::MatchAll => panic!("expected predicate"),
        }
    }

    #[test]
    fn test_partial_params_match_all() {
        assert!(parse_filter::<Tenant>(&query(Some("Ann"), None)).unwrap().is_match_all());
        assert!(parse_filter::<Tenant>(&query(None, Some("name"))).unwrap().is_match_all());
        assert!(parse_filter::<Tenant>(&ListQuery::default()).unwrap().is_match_all());
    }

    #[test]
    fn test_malformed_field_lists() {
        for fields in ["name,,email", "colour", "pin", ""] {
            let err = parse_filter::<Tenant>(&query(Some("x"), Some(fields))).unwrap_err();
            assert_eq!(err.message_code(), "ERROR_WITH_FILTER", "fields={fields:?}");
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
