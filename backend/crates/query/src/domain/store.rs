//! Generic document store contract

use uuid::Uuid;

use crate::domain::entity::{Attributes, Document, Entity};
use crate::domain::filter::Predicate;
use crate::domain::pagination::{Page, PageSpec};
use crate::error::QueryResult;

/// Storage behind the generic CRUD endpoints
///
/// Attributes reaching `create`/`update` are already validated against
/// `E::FIELDS`. Returned documents contain readable fields only.
// Hand-expanded equivalent of `#[trait_variant::make(Store: Send)]`: the
// macro's blanket impl cannot infer the `E` type parameter on generic methods.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    async fn list<E: Entity>(&self, predicate: &Predicate, spec: &PageSpec) -> QueryResult<Page<Document>>;

    /// Fails with `NotFound` if absent
    async fn get<E: Entity>(&self, id: Uuid) -> QueryResult<Document>;

    async fn create<E: Entity>(&self, attrs: &Attributes) -> QueryResult<Document>;

    /// Fails with `NotFound` if absent
    async fn update<E: Entity>(&self, id: Uuid, attrs: &Attributes) -> QueryResult<Document>;

    /// Fails with `NotFound` if absent
    async fn delete<E: Entity>(&self, id: Uuid) -> QueryResult<()>;
}

/// `Send` variant of [`LocalStore`]
pub trait Store: Send {
    fn list<E: Entity>(
        &self,
        predicate: &Predicate,
        spec: &PageSpec,
    ) -> impl Future<Output = QueryResult<Page<Document>>> + Send;

    /// Fails with `NotFound` if absent
    fn get<E: Entity>(&self, id: Uuid) -> impl Future<Output = QueryResult<Document>> + Send;

    fn create<E: Entity>(&self, attrs: &Attributes) -> impl Future<Output = QueryResult<Document>> + Send;

    /// Fails with `NotFound` if absent
    fn update<E: Entity>(
        &self,
        id: Uuid,
        attrs: &Attributes,
    ) -> impl Future<Output = QueryResult<Document>> + Send;

    /// Fails with `NotFound` if absent
    fn delete<E: Entity>(&self, id: Uuid) -> impl Future<Output = QueryResult<()>> + Send;
}

impl<T: Store> LocalStore for T {
    async fn list<E: Entity>(&self, predicate: &Predicate, spec: &PageSpec) -> QueryResult<Page<Document>> {
        <Self as Store>::list::<E>(self, predicate, spec).await
    }

    async fn get<E: Entity>(&self, id: Uuid) -> QueryResult<Document> {
        <Self as Store>::get::<E>(self, id).await
    }

    async fn create<E: Entity>(&self, attrs: &Attributes) -> QueryResult<Document> {
        <Self as Store>::create::<E>(self, attrs).await
    }

    async fn update<E: Entity>(&self, id: Uuid, attrs: &Attributes) -> QueryResult<Document> {
        <Self as Store>::update::<E>(self, id, attrs).await
    }

    async fn delete<E: Entity>(&self, id: Uuid) -> QueryResult<()> {
        <Self as Store>::delete::<E>(self, id).await
    }
}
