//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::AuthRepository;
use crate::domain::value_object::AccountRole;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::with_roles;

/// Create the Auth router for any repository implementation
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepository,
{
    let profile = Router::new()
        .route(
            "/profile",
            get(handlers::get_profile::<R>).patch(handlers::update_profile::<R>),
        )
        .route("/profile/changePassword", post(handlers::change_password::<R>));
    let profile = with_roles(profile, &state, &[AccountRole::User, AccountRole::Admin]);

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/register", post(handlers::register::<R>))
        .route("/verify", post(handlers::verify::<R>))
        .route("/forgot", post(handlers::forgot_password::<R>))
        .route("/reset", post(handlers::reset_password::<R>))
        .route("/token", get(handlers::refresh_token::<R>))
        .merge(profile)
        .with_state(state)
}
