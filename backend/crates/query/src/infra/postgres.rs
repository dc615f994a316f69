//! PostgreSQL Store
//!
//! Documents are assembled in SQL with `jsonb_build_object` so rows come
//! back keyed by API field name. Writes go through `jsonb_populate_record`,
//! letting Postgres cast each JSON value to its column type.

use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{Attributes, Document, Entity};
use crate::domain::filter::{Predicate, like_pattern};
use crate::domain::pagination::{Page, PageSpec};
use crate::domain::store::Store;
use crate::error::{QueryError, QueryResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `jsonb_build_object('id', d.id, 'createdAt', d.created_at, ...)`
fn push_document<E: Entity>(qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
    qb.push("jsonb_build_object(");
    for (i, field) in E::readable_fields().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format_args!("'{}', {}.{}", field.name, alias, field.column));
    }
    qb.push(")");
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate, alias: &str) {
    let Predicate::AnyContains { needle, fields } = predicate else {
        return;
    };
    let pattern = like_pattern(needle);
    qb.push(" WHERE (");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format_args!("{}.{}::text ILIKE ", alias, field.column));
        qb.push_bind(pattern.clone());
    }
    qb.push(")");
}

/// API-keyed attributes to a column-keyed JSON object
fn to_columns<E: Entity>(attrs: &Attributes) -> QueryResult<(Vec<&'static str>, Value)> {
    let mut columns = Vec::with_capacity(attrs.len());
    let mut record = serde_json::Map::new();
    for (name, value) in attrs {
        let field = E::field(name).ok_or_else(|| QueryError::Internal(format!("unmapped field {name}")))?;
        columns.push(field.column);
        record.insert(field.column.to_string(), value.clone());
    }
    Ok((columns, Value::Object(record)))
}

impl Store for PgStore {
    async fn list<E: Entity>(&self, predicate: &Predicate, spec: &PageSpec) -> QueryResult<Page<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        push_document::<E>(&mut qb, "d");
        qb.push(" AS doc, COUNT(*) OVER() AS total_count FROM ");
        qb.push(E::TABLE).push(" AS d");
        push_predicate(&mut qb, predicate, "d");
        qb.push(format_args!(
            " ORDER BY d.{col} {ord}, d.id {ord} LIMIT ",
            col = spec.sort.column,
            ord = spec.order.as_sql()
        ));
        qb.push_bind(i64::from(spec.limit));
        qb.push(" OFFSET ");
        qb.push_bind(spec.offset() as i64);

        let rows: Vec<(Json<Document>, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        // The window count rides on every row; past the last page there are none
        let total = match rows.first() {
            Some((_, total)) => *total,
            None if spec.page > 1 => {
                let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
                count.push(E::TABLE).push(" AS d");
                push_predicate(&mut count, predicate, "d");
                count.build_query_scalar::<i64>().fetch_one(&self.pool).await?
            }
            None => 0,
        };

        let docs = rows.into_iter().map(|(Json(doc), _)| doc).collect();
        Ok(Page::new(docs, total.max(0) as u64, spec))
    }

    async fn get<E: Entity>(&self, id: Uuid) -> QueryResult<Document> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        push_document::<E>(&mut qb, "d");
        qb.push(" FROM ").push(E::TABLE).push(" AS d WHERE d.id = ");
        qb.push_bind(id);

        let doc: Option<Json<Document>> = qb.build_query_scalar().fetch_optional(&self.pool).await?;
        doc.map(|Json(doc)| doc).ok_or(QueryError::NotFound)
    }

    async fn create<E: Entity>(&self, attrs: &Attributes) -> QueryResult<Document> {
        let (columns, record) = to_columns::<E>(attrs)?;

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(E::TABLE).push(" AS d ");
        if columns.is_empty() {
            qb.push("DEFAULT VALUES");
        } else {
            let list = columns.join(", ");
            qb.push(format_args!("({list}) SELECT {list} FROM jsonb_populate_record(NULL::{}, ", E::TABLE));
            qb.push_bind(Json(record));
            qb.push(")");
        }
        qb.push(" RETURNING ");
        push_document::<E>(&mut qb, "d");

        let Json(doc) = qb.build_query_scalar::<Json<Document>>().fetch_one(&self.pool).await?;
        Ok(doc)
    }

    async fn update<E: Entity>(&self, id: Uuid, attrs: &Attributes) -> QueryResult<Document> {
        let (columns, record) = to_columns::<E>(attrs)?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(E::TABLE).push(" AS d SET ");
        for column in &columns {
            qb.push(format_args!("{column} = r.{column}, "));
        }
        qb.push("updated_at = now() FROM jsonb_populate_record(");
        qb.push(format_args!("NULL::{}, ", E::TABLE));
        qb.push_bind(Json(record));
        qb.push(") AS r WHERE d.id = ");
        qb.push_bind(id);
        qb.push(" RETURNING ");
        push_document::<E>(&mut qb, "d");

        let doc: Option<Json<Document>> = qb.build_query_scalar().fetch_optional(&self.pool).await?;
        doc.map(|Json(doc)| doc).ok_or(QueryError::NotFound)
    }

    async fn delete<E: Entity>(&self, id: Uuid) -> QueryResult<()> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(E::TABLE).push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(QueryError::NotFound);
        }
        Ok(())
    }
}
