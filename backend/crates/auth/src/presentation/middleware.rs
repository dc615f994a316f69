//! Auth Middleware
//!
//! `require_auth` resolves the bearer token into an [`AuthenticatedAccount`];
//! `require_roles` loads that account and checks it against an allowed role
//! set, leaving a [`CurrentAccount`] for the handler.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use platform::client::{RequestMeta, extract_bearer_token, extract_request_meta};

use crate::application::RoleAuthorizationUseCase;
use crate::domain::entity::Account;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{AccountId, AccountRole};
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AuthAppState;

/// Account id resolved from a valid bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount(pub AccountId);

/// Account loaded and role-checked by `require_roles`
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Client ip/browser/country of the current request
#[derive(Debug, Clone)]
pub struct ClientMeta(pub RequestMeta);

impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .copied()
            .ok_or(AuthError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientMeta(extract_request_meta(&parts.headers, direct_ip)))
    }
}

/// Middleware that requires a valid bearer token
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> AuthResult<Response>
where
    R: AuthRepository,
{
    let token = extract_bearer_token(req.headers()).ok_or(AuthError::Unauthenticated)?;

    let account_id = state.tokens.resolve(token).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        AuthError::Unauthenticated
    })?;

    req.extensions_mut().insert(AuthenticatedAccount(account_id));
    Ok(next.run(req).await)
}

/// State for `require_roles`
pub struct RoleGate<R>
where
    R: AuthRepository,
{
    pub app: AuthAppState<R>,
    pub allowed: Arc<[AccountRole]>,
}

impl<R> Clone for RoleGate<R>
where
    R: AuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            allowed: self.allowed.clone(),
        }
    }
}

/// Middleware that requires the authenticated account to hold an allowed role
pub async fn require_roles<R>(
    State(gate): State<RoleGate<R>>,
    mut req: Request<Body>,
    next: Next,
) -> AuthResult<Response>
where
    R: AuthRepository,
{
    let AuthenticatedAccount(account_id) = req
        .extensions()
        .get::<AuthenticatedAccount>()
        .copied()
        .ok_or(AuthError::Unauthenticated)?;

    let use_case = RoleAuthorizationUseCase::new(gate.app.repo.clone(), gate.app.config.clone());
    let account = use_case.execute(&account_id, &gate.allowed).await?;

    req.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(req).await)
}

/// Protect every route of `router` with a bearer token and a role set
pub fn with_roles<R, S>(router: Router<S>, state: &AuthAppState<R>, allowed: &[AccountRole]) -> Router<S>
where
    R: AuthRepository,
    S: Clone + Send + Sync + 'static,
{
    let gate = RoleGate {
        app: state.clone(),
        allowed: allowed.into(),
    };

    // Layers run outermost-first: authenticate, then authorize
    router
        .layer(from_fn_with_state(gate, require_roles::<R>))
        .layer(from_fn_with_state(state.clone(), require_auth::<R>))
}
