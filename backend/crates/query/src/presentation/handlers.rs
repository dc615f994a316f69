//! Generic CRUD handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::error::code;
use platform::retry::RetryPolicy;
use serde::Serialize;

use crate::application::CrudUseCase;
use crate::domain::entity::{Attributes, Document, Entity};
use crate::domain::filter::ListQuery;
use crate::domain::pagination::Page;
use crate::domain::store::Store;
use crate::error::QueryResult;

/// Shared state for one resource
pub struct CrudState<E, S>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    pub entity: Arc<E>,
    pub store: Arc<S>,
    pub retry: RetryPolicy,
}

impl<E, S> Clone for CrudState<E, S>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            store: self.store.clone(),
            retry: self.retry,
        }
    }
}

impl<E, S> CrudState<E, S>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    pub fn new(entity: E, store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            entity: Arc::new(entity),
            store,
            retry,
        }
    }

    fn use_case(&self) -> CrudUseCase<E, S> {
        CrudUseCase::new(self.entity.clone(), self.store.clone(), self.retry)
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub msg: &'static str,
}

/// GET /
pub async fn list_items<E, S>(
    State(state): State<CrudState<E, S>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> QueryResult<Json<Page<Document>>>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    let Query(query) = query?;
    Ok(Json(state.use_case().list(&query).await?))
}

/// GET /{id}
pub async fn get_item<E, S>(
    State(state): State<CrudState<E, S>>,
    Path(id): Path<String>,
) -> QueryResult<Json<Document>>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    Ok(Json(state.use_case().get(&id).await?))
}

/// POST /
pub async fn create_item<E, S>(
    State(state): State<CrudState<E, S>>,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> QueryResult<impl IntoResponse>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    let Json(attrs) = payload?;
    let doc = state.use_case().create(attrs).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// PATCH /{id}
pub async fn update_item<E, S>(
    State(state): State<CrudState<E, S>>,
    Path(id): Path<String>,
    payload: Result<Json<Attributes>, JsonRejection>,
) -> QueryResult<Json<Document>>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    let Json(attrs) = payload?;
    Ok(Json(state.use_case().update(&id, attrs).await?))
}

/// DELETE /{id}
pub async fn delete_item<E, S>(
    State(state): State<CrudState<E, S>>,
    Path(id): Path<String>,
) -> QueryResult<Json<DeletedResponse>>
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    state.use_case().delete(&id).await?;
    Ok(Json(DeletedResponse { msg: code::DELETED }))
}
