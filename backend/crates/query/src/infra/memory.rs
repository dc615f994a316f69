//! In-memory Store
//!
//! Backs tests and local runs without a database. Mirrors the Postgres
//! store: case-insensitive unique constraints, filter/sort/page semantics
//! and hidden write-only fields.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::SecondsFormat;
use platform::clock::{Clock, SystemClock};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entity::{Attributes, Document, Entity};
use crate::domain::filter::Predicate;
use crate::domain::pagination::{Page, PageSpec, SortOrder};
use crate::domain::store::Store;
use crate::error::{QueryError, QueryResult};

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<&'static str, Vec<Document>>>>,
    clock: Arc<dyn Clock>,
    failing_reads: Arc<AtomicU32>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::default(),
            clock,
            failing_reads: Arc::default(),
        }
    }

    /// Make the next `n` reads fail with `StorageUnavailable`
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, AtomicOrdering::SeqCst);
    }

    /// Raw rows of `E`, write-only fields included
    pub fn rows<E: Entity>(&self) -> Vec<Document> {
        self.lock().get(E::TABLE).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, Vec<Document>>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_gate(&self) -> QueryResult<()> {
        let consumed = self
            .failing_reads
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(QueryError::StorageUnavailable),
            Err(_) => Ok(()),
        }
    }

    fn timestamp(&self) -> Value {
        Value::String(self.clock.now().to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

fn id_of(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

fn public<E: Entity>(doc: &Document) -> Document {
    E::readable_fields()
        .map(|f| (f.name.to_string(), doc.get(f.name).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::MatchAll => true,
        Predicate::AnyContains { needle, fields } => {
            let needle = needle.to_lowercase();
            fields.iter().any(|f| {
                doc.get(f.name)
                    .and_then(as_text)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        }
    }
}

/// Nulls first, then numbers, strings and booleans in their natural order
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Reject `attrs` if a unique field collides with another row
fn check_unique<E: Entity>(rows: &[Document], attrs: &Attributes, except: Option<&str>) -> QueryResult<()> {
    for field in E::FIELDS {
        let (Some(constraint), Some(value)) = (field.unique, attrs.get(field.name).and_then(as_text)) else {
            continue;
        };
        let value = value.to_lowercase();
        let taken = rows.iter().filter(|row| id_of(row) != except).any(|row| {
            row.get(field.name)
                .and_then(as_text)
                .is_some_and(|v| v.to_lowercase() == value)
        });
        if taken {
            return Err(QueryError::Validation(constraint.to_string()));
        }
    }
    Ok(())
}

impl Store for MemoryStore {
    async fn list<E: Entity>(&self, predicate: &Predicate, spec: &PageSpec) -> QueryResult<Page<Document>> {
        self.read_gate()?;
        let tables = self.lock();
        let mut rows: Vec<&Document> = tables
            .get(E::TABLE)
            .map(|rows| rows.iter().filter(|doc| matches(doc, predicate)).collect())
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            let ord = compare(a.get(spec.sort.name), b.get(spec.sort.name))
                .then_with(|| compare(a.get("id"), b.get("id")));
            match spec.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });

        let total = rows.len() as u64;
        let docs = rows
            .into_iter()
            .skip(spec.offset() as usize)
            .take(spec.limit as usize)
            .map(public::<E>)
            .collect();
        Ok(Page::new(docs, total, spec))
    }

    async fn get<E: Entity>(&self, id: Uuid) -> QueryResult<Document> {
        self.read_gate()?;
        let id = id.to_string();
        self.lock()
            .get(E::TABLE)
            .and_then(|rows| rows.iter().find(|doc| id_of(doc) == Some(id.as_str())))
            .map(public::<E>)
            .ok_or(QueryError::NotFound)
    }

    async fn create<E: Entity>(&self, attrs: &Attributes) -> QueryResult<Document> {
        let now = self.timestamp();
        let mut tables = self.lock();
        let rows = tables.entry(E::TABLE).or_default();
        check_unique::<E>(rows, attrs, None)?;

        let mut doc = attrs.clone();
        doc.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        doc.insert("createdAt".into(), now.clone());
        doc.insert("updatedAt".into(), now);
        rows.push(doc.clone());
        Ok(public::<E>(&doc))
    }

    async fn update<E: Entity>(&self, id: Uuid, attrs: &Attributes) -> QueryResult<Document> {
        let now = self.timestamp();
        let id = id.to_string();
        let mut tables = self.lock();
        let rows = tables.entry(E::TABLE).or_default();
        check_unique::<E>(rows, attrs, Some(id.as_str()))?;

        let doc = rows
            .iter_mut()
            .find(|doc| id_of(doc) == Some(id.as_str()))
            .ok_or(QueryError::NotFound)?;
        for (name, value) in attrs {
            doc.insert(name.clone(), value.clone());
        }
        doc.insert("updatedAt".into(), now);
        Ok(public::<E>(doc))
    }

    async fn delete<E: Entity>(&self, id: Uuid) -> QueryResult<()> {
        let id = id.to_string();
        let mut tables = self.lock();
        let rows = tables.entry(E::TABLE).or_default();
        let before = rows.len();
        rows.retain(|doc| id_of(doc) != Some(id.as_str()));
        if rows.len() == before {
            return Err(QueryError::NotFound);
        }
        Ok(())
    }
}
