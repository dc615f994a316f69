//! Domain Layer

pub mod entity;
pub mod filter;
pub mod pagination;
pub mod store;

pub use entity::{Access, Attributes, Document, Entity, Field, FieldKind, WriteMode};
pub use filter::{ListQuery, Predicate, parse_filter};
pub use pagination::{Page, PageSpec, SortOrder, paginate};
pub use store::{LocalStore, Store};
