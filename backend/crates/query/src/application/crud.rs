//! Generic CRUD use case
//!
//! Reads are retried on transient storage failures. Writes run under the
//! same timeout but are never retried.

use std::sync::Arc;

use platform::retry::{RetryPolicy, retry_transient, with_timeout};

use crate::domain::entity::{Attributes, Document, Entity, WriteMode, parse_id, validate_attributes};
use crate::domain::filter::{ListQuery, parse_filter};
use crate::domain::pagination::{Page, paginate};
use crate::domain::store::Store;
use crate::error::{QueryError, QueryResult};

pub struct CrudUseCase<E, S>
where
    E: Entity,
    S: Store + Send + Sync,
{
    entity: Arc<E>,
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<E, S> CrudUseCase<E, S>
where
    E: Entity,
    S: Store + Send + Sync,
{
    pub fn new(entity: Arc<E>, store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { entity, store, retry }
    }

    pub async fn list(&self, query: &ListQuery) -> QueryResult<Page<Document>> {
        let predicate = parse_filter::<E>(query)?;
        let spec = paginate::<E>(query);
        retry_transient(&self.retry, || self.store.list::<E>(&predicate, &spec)).await
    }

    pub async fn get(&self, raw_id: &str) -> QueryResult<Document> {
        let id = parse_id(raw_id)?;
        retry_transient(&self.retry, || self.store.get::<E>(id)).await
    }

    pub async fn create(&self, attrs: Attributes) -> QueryResult<Document> {
        let mut attrs = validate_attributes::<E>(attrs, WriteMode::Create)?;
        self.entity.prepare(&mut attrs, WriteMode::Create)?;

        let doc = with_timeout(self.retry.timeout, self.store.create::<E>(&attrs))
            .await
            .map_err(|e| self.translate(e))?;

        tracing::info!(entity = E::NAME, id = ?doc.get("id"), "Created");
        Ok(doc)
    }

    pub async fn update(&self, raw_id: &str, attrs: Attributes) -> QueryResult<Document> {
        let id = parse_id(raw_id)?;
        let mut attrs = validate_attributes::<E>(attrs, WriteMode::Update)?;
        self.entity.prepare(&mut attrs, WriteMode::Update)?;

        let doc = with_timeout(self.retry.timeout, self.store.update::<E>(id, &attrs))
            .await
            .map_err(|e| self.translate(e))?;

        tracing::info!(entity = E::NAME, %id, "Updated");
        Ok(doc)
    }

    pub async fn delete(&self, raw_id: &str) -> QueryResult<()> {
        let id = parse_id(raw_id)?;
        with_timeout(self.retry.timeout, self.store.delete::<E>(id)).await?;

        tracing::info!(entity = E::NAME, %id, "Deleted");
        Ok(())
    }

    /// Replace constraint names with the entity's client message
    fn translate(&self, err: QueryError) -> QueryError {
        match err {
            QueryError::Validation(constraint) => match self.entity.constraint_message(&constraint) {
                Some(message) => QueryError::Validation(message.to_string()),
                None => QueryError::Validation(constraint),
            },
            other => other,
        }
    }
}
