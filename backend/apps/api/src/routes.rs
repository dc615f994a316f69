//! Router composition

use std::sync::Arc;

use auth::domain::repository::AuthRepository;
use auth::middleware::with_roles;
use auth::models::AccountRole;
use auth::{AuthAppState, auth_router};
use axum::Router;
use query::domain::Store;
use query::{CrudState, crud_router};

use crate::users::UserResource;

/// Auth endpoints at the root, admin-only `/users` resource
pub fn app_router<R, S>(auth: AuthAppState<R>, store: Arc<S>) -> Router
where
    R: AuthRepository,
    S: Store + Send + Sync + 'static,
{
    let users = CrudState::new(
        UserResource::new(auth.config.password_cost),
        store,
        auth.config.storage_retry,
    );
    let users = with_roles(crud_router(users), &auth, &[AccountRole::Admin]);

    Router::new()
        .nest("/users", users)
        .merge(auth_router(auth))
}
