//! CRUD Router

use axum::Router;
use axum::routing::get;

use crate::domain::entity::Entity;
use crate::domain::store::Store;
use crate::presentation::handlers::{self, CrudState};

/// List/get/create/update/delete routes for one entity, meant to be nested
pub fn crud_router<E, S>(state: CrudState<E, S>) -> Router
where
    E: Entity,
    S: Store + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_items::<E, S>).post(handlers::create_item::<E, S>),
        )
        .route(
            "/{id}",
            get(handlers::get_item::<E, S>)
                .patch(handlers::update_item::<E, S>)
                .delete(handlers::delete_item::<E, S>),
        )
        .with_state(state)
}
