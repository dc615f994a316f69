//! Sort and page parameters, and the page envelope returned by list endpoints

use serde::Serialize;

use crate::domain::entity::{CREATED_AT, Entity, Field};
use crate::domain::filter::ListQuery;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// `1`/`asc`/`ascending` sort up; anything else sorts down
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("1" | "asc" | "ascending") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Resolved sort/page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub sort: &'static Field,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl PageSpec {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Resolve sort and pagination parameters
///
/// Unknown sort fields fall back to `createdAt`. Non-numeric `page`/`limit`
/// fall back to their defaults; `page < 1` becomes 1 and `limit` is clamped
/// to `1..=100`.
pub fn paginate<E: Entity>(query: &ListQuery) -> PageSpec {
    let sort = query
        .sort
        .as_deref()
        .and_then(|name| E::field(name.trim()))
        .filter(|f| f.is_readable())
        .or_else(|| E::field(CREATED_AT.name))
        .unwrap_or(&CREATED_AT);

    let page = parse_number(query.page.as_deref()).unwrap_or(i64::from(DEFAULT_PAGE));
    let limit = parse_number(query.limit.as_deref()).unwrap_or(i64::from(DEFAULT_LIMIT));

    PageSpec {
        sort,
        order: SortOrder::parse(query.order.as_deref()),
        page: page.clamp(1, i64::from(u32::MAX)) as u32,
        limit: limit.clamp(1, i64::from(MAX_LIMIT)) as u32,
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// One page of documents
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u32,
    pub page: u32,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, spec: &PageSpec) -> Self {
        let total_pages = total_docs.div_ceil(u64::from(spec.limit)).max(1);
        Self {
            docs,
            total_docs,
            limit: spec.limit,
            page: spec.page,
            total_pages,
            has_prev_page: spec.page > 1,
            has_next_page: u64::from(spec.page) < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{FieldKind, ID, UPDATED_AT};

    struct Receipt;

    impl Entity for Receipt {
        const NAME: &'static str = "receipt";
        const TABLE: &'static str = "receipts";
        const FIELDS: &'static [Field] = &[
            ID,
            Field::new("amount", "amount", FieldKind::Number),
            Field::new("token", "token", FieldKind::Text).write_only(),
            CREATED_AT,
            UPDATED_AT,
        ];
    }

    fn query(sort: Option<&str>, order: Option<&str>, page: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            sort: sort.map(String::from),
            order: order.map(String::from),
            page: page.map(String::from),
            limit: limit.map(String::from),
            ..ListQuery::default()
        }
    }

    #[test]
    fn test_defaults() {
        let spec = paginate::<Receipt>(&ListQuery::default());
        assert_eq!(spec.sort.column, "created_at");
        assert_eq!(spec.order, SortOrder::Descending);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, 5);
        assert_eq!(spec.offset(), 0);
    }

    #[test]
    fn test_explicit_values() {
        let spec = paginate::<Receipt>(&query(Some("amount"), Some("1"), Some("3"), Some("20")));
        assert_eq!(spec.sort.column, "amount");
        assert_eq!(spec.order, SortOrder::Ascending);
        assert_eq!(spec.offset(), 40);
    }

    #[test]
    fn test_non_numeric_values_fall_back() {
        let spec = paginate::<Receipt>(&query(None, None, Some("abc"), Some("lots")));
        assert_eq!((spec.page, spec.limit), (1, 5));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let spec = paginate::<Receipt>(&query(None, None, Some("-4"), Some("100000")));
        assert_eq!((spec.page, spec.limit), (1, 100));
        let spec = paginate::<Receipt>(&query(None, None, Some("0"), Some("0")));
        assert_eq!((spec.page, spec.limit), (1, 1));
    }

    #[test]
    fn test_unknown_or_hidden_sort_falls_back() {
        assert_eq!(paginate::<Receipt>(&query(Some("colour"), None, None, None)).sort.name, "createdAt");
        assert_eq!(paginate::<Receipt>(&query(Some("token"), None, None, None)).sort.name, "createdAt");
    }

    #[test]
    fn test_order_spellings() {
        for raw in ["1", "asc", "ASC", "ascending"] {
            assert_eq!(SortOrder::parse(Some(raw)), SortOrder::Ascending);
        }
        for raw in ["-1", "desc", "descending", "sideways"] {
            assert_eq!(SortOrder::parse(Some(raw)), SortOrder::Descending);
        }
    }

    #[test]
    fn test_page_envelope() {
        let spec = paginate::<Receipt>(&query(None, None, Some("2"), Some("5")));
        let page = Page::new(vec![1, 2, 3, 4, 5], 12, &spec);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalDocs"], 12);
        assert_eq!(json["hasNextPage"], true);
    }

    #[test]
    fn test_empty_page_envelope() {
        let page: Page<u8> = Page::new(vec![], 0, &paginate::<Receipt>(&ListQuery::default()));
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_prev_page);
        assert!(!page.has_next_page);
    }
}
