//! Query Translator
//!
//! Turns list query strings into predicates and page specs, and exposes
//! any [`Entity`](domain::Entity) through a generic CRUD contract.
//!
//! - `domain/` - Entity schema, filter/sort/page parsing, store trait
//! - `application/` - CRUD use case (validation, retries, timeouts)
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - Generic handlers and `crud_router`

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use domain::{Entity, Field, FieldKind, Page, Store};
pub use error::{QueryError, QueryResult};
pub use infra::{MemoryStore, PgStore};
pub use presentation::{CrudState, crud_router};
