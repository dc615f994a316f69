//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use kernel::error::code;
use platform::client::extract_bearer_token;
use platform::clock::Clock;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ForgotPasswordUseCase, LoginInput, LoginUseCase, NotificationDispatcher,
    ProfileUseCase, RefreshTokenUseCase, RegisterInput, RegisterUseCase, ResetPasswordInput,
    ResetPasswordUseCase, TokenService, VerifyUseCase,
};
use crate::domain::entity::ProfileUpdate;
use crate::domain::repository::AuthRepository;
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::Mailer;
use crate::presentation::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, SessionResponse, TokenResponse,
    UpdateProfileRequest, UserSummary, VerifyRequest, VerifyResponse,
};
use crate::presentation::middleware::{ClientMeta, CurrentAccount};

/// Shared state for auth handlers
pub struct AuthAppState<R>
where
    R: AuthRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<TokenService>,
    pub notifications: NotificationDispatcher<R, Mailer>,
}

impl<R> Clone for AuthAppState<R>
where
    R: AuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            tokens: self.tokens.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: AuthRepository,
{
    pub fn new(repo: R, config: AuthConfig, clock: Arc<dyn Clock>, mailer: Mailer) -> AuthResult<Self> {
        let repo = Arc::new(repo);
        let tokens = Arc::new(TokenService::new(&config, clock.clone())?);
        let notifications = NotificationDispatcher::new(repo.clone(), Arc::new(mailer), clock.clone());
        Ok(Self {
            repo,
            config: Arc::new(config),
            clock,
            tokens,
            notifications,
        })
    }

    fn summary(&self, account: &crate::domain::entity::Account) -> UserSummary {
        UserSummary::from_account(account, self.config.exposes_verification())
    }
}

// ============================================================================
// Login / Register
// ============================================================================

/// POST /login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    ClientMeta(meta): ClientMeta,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<SessionResponse>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(
            LoginInput {
                email: req.email,
                password: req.password,
            },
            meta,
        )
        .await?;

    Ok(Json(SessionResponse {
        user: state.summary(&output.account),
        token: output.token,
    }))
}

/// POST /register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.notifications.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: state.summary(&output.account),
            token: output.token,
        }),
    ))
}

// ============================================================================
// Verification / Reset
// ============================================================================

/// POST /verify
pub async fn verify<R>(
    State(state): State<AuthAppState<R>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> AuthResult<Json<VerifyResponse>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = VerifyUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case.execute(&req.id).await?;

    Ok(Json(VerifyResponse {
        email: output.email,
        verified: output.verified,
    }))
}

/// POST /forgot
pub async fn forgot_password<R>(
    State(state): State<AuthAppState<R>>,
    ClientMeta(meta): ClientMeta,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> AuthResult<Json<ForgotPasswordResponse>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.notifications.clone(),
        state.clock.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(req.email, meta).await?;

    Ok(Json(ForgotPasswordResponse {
        msg: code::RESET_EMAIL_SENT.to_string(),
        email: output.email,
        verification: state
            .config
            .exposes_verification()
            .then_some(output.verification),
    }))
}

/// POST /reset
pub async fn reset_password<R>(
    State(state): State<AuthAppState<R>>,
    ClientMeta(meta): ClientMeta,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case =
        ResetPasswordUseCase::new(state.repo.clone(), state.clock.clone(), state.config.clone());
    use_case
        .execute(
            ResetPasswordInput {
                token: req.id,
                password: req.password,
            },
            meta,
        )
        .await?;

    Ok(Json(MessageResponse::new(code::PASSWORD_CHANGED)))
}

// ============================================================================
// Refresh
// ============================================================================

/// GET /token
///
/// 認証ヘッダーが無い場合は 401、トークンが不正な場合は 409 BAD_TOKEN。
pub async fn refresh_token<R>(
    State(state): State<AuthAppState<R>>,
    ClientMeta(meta): ClientMeta,
    headers: HeaderMap,
) -> AuthResult<Json<TokenResponse>>
where
    R: AuthRepository,
{
    let bearer = extract_bearer_token(&headers).ok_or(AuthError::Unauthenticated)?;

    let use_case = RefreshTokenUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.clock.clone(),
        state.config.clone(),
    );
    let token = use_case.execute(bearer, meta).await?;

    Ok(Json(TokenResponse { token }))
}

// ============================================================================
// Profile (requires authentication)
// ============================================================================

/// GET /profile
pub async fn get_profile<R>(
    State(state): State<AuthAppState<R>>,
    CurrentAccount(account): CurrentAccount,
) -> AuthResult<Json<UserSummary>>
where
    R: AuthRepository,
{
    Ok(Json(state.summary(&account)))
}

/// PATCH /profile
pub async fn update_profile<R>(
    State(state): State<AuthAppState<R>>,
    CurrentAccount(account): CurrentAccount,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AuthResult<Json<UserSummary>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = ProfileUseCase::new(state.repo.clone(), state.config.clone());
    let updated = use_case
        .update(
            &account.id,
            ProfileUpdate {
                name: req.name,
                phone: req.phone,
            },
        )
        .await?;

    Ok(Json(state.summary(&updated)))
}

/// POST /profile/changePassword
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    CurrentAccount(account): CurrentAccount,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthRepository,
{
    let Json(req) = payload?;

    let use_case = ProfileUseCase::new(state.repo.clone(), state.config.clone());
    use_case
        .change_password(
            &account.id,
            ChangePasswordInput {
                old_password: req.old_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new(code::PASSWORD_CHANGED)))
}
