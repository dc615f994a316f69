//! Scenario tests for the auth crate
//!
//! Everything runs against the in-memory repository, a manual clock and the
//! in-memory mailer, so lockout windows and token expiry are deterministic.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::task::JoinSet;
use platform::client::RequestMeta;
use platform::clock::{Clock, ManualClock};
use platform::password::ClearTextPassword;

use crate::application::{
    ForgotPasswordUseCase, LoginInput, LoginOutput, LoginUseCase, RefreshTokenUseCase,
    RegisterInput, RegisterOutput, RegisterUseCase, ResetPasswordInput, ResetPasswordUseCase,
    RoleAuthorizationUseCase, VerifyUseCase,
};
use crate::domain::entity::DeliveryStatus;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{AccountId, AccountRole, AccountStatus};
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::{Mailer, MemoryNotifier};
use crate::infra::memory::InMemoryAuthRepository;
use crate::{AuthAppState, AuthConfig};

const EMAIL: &str = "a@b.com";
const PASSWORD: &str = "secret1";

struct Harness {
    repo: InMemoryAuthRepository,
    clock: ManualClock,
    state: AuthAppState<InMemoryAuthRepository>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(AuthConfig::for_tests())
    }

    fn with_config(config: AuthConfig) -> Self {
        let repo = InMemoryAuthRepository::new();
        let clock = ManualClock::new(Utc::now());
        let state = AuthAppState::new(
            repo.clone(),
            config,
            Arc::new(clock.clone()),
            Mailer::Memory(MemoryNotifier::new()),
        )
        .unwrap();
        Self { repo, clock, state }
    }

    fn mailer(&self) -> &MemoryNotifier {
        self.state.notifications.notifier().as_memory().unwrap()
    }

    async fn register(&self, email: &str, password: &str) -> AuthResult<RegisterOutput> {
        RegisterUseCase::new(
            self.state.repo.clone(),
            self.state.tokens.clone(),
            self.state.notifications.clone(),
            self.state.clock.clone(),
            self.state.config.clone(),
        )
        .execute(RegisterInput {
            name: "Ann".into(),
            email: email.into(),
            password: password.into(),
            phone: "254700000000".into(),
        })
        .await
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutput> {
        LoginUseCase::new(
            self.state.repo.clone(),
            self.state.tokens.clone(),
            self.state.clock.clone(),
            self.state.config.clone(),
        )
        .execute(
            LoginInput {
                email: email.into(),
                password: password.into(),
            },
            meta("10.0.0.1"),
        )
        .await
    }

    async fn forgot(&self, email: &str) -> AuthResult<String> {
        ForgotPasswordUseCase::new(
            self.state.repo.clone(),
            self.state.notifications.clone(),
            self.state.clock.clone(),
            self.state.config.clone(),
        )
        .execute(email.into(), meta("10.0.0.2"))
        .await
        .map(|out| out.verification)
    }

    async fn reset(&self, token: &str, password: &str) -> AuthResult<()> {
        ResetPasswordUseCase::new(
            self.state.repo.clone(),
            self.state.clock.clone(),
            self.state.config.clone(),
        )
        .execute(
            ResetPasswordInput {
                token: token.into(),
                password: password.into(),
            },
            meta("10.0.0.3"),
        )
        .await
    }

    async fn verify(&self, token: &str) -> AuthResult<()> {
        VerifyUseCase::new(self.state.repo.clone(), self.state.config.clone())
            .execute(token)
            .await
            .map(|_| ())
    }

    /// Wait for background email tasks to record their outcome
    async fn wait_for_notifications(&self, count: usize) {
        for _ in 0..200 {
            if self.repo.notifications().len() >= count {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        panic!("expected {count} notifications, got {}", self.repo.notifications().len());
    }
}

fn meta(ip: &str) -> RequestMeta {
    RequestMeta {
        ip: ip.into(),
        browser: "Firefox 128".into(),
        country: "KE".into(),
    }
}

#[cfg(test)]
mod login_guard_tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_password_increments_counter() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();

        let err = h.login(EMAIL, "wrong-pass").await.err().unwrap();
        assert!(matches!(err, AuthError::WrongPassword));
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 1);
    }

    #[tokio::test]
    async fn test_sixth_failure_blocks_for_two_hours() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();

        for _ in 0..5 {
            assert!(matches!(h.login(EMAIL, "wrong-pass").await, Err(AuthError::WrongPassword)));
        }
        assert!(matches!(h.login(EMAIL, "wrong-pass").await, Err(AuthError::BlockedUser)));

        let account = h.repo.account_by_email(EMAIL).unwrap();
        assert_eq!(account.login_attempts, 6);
        assert_eq!(account.block_expires, Some(h.clock.now() + Duration::hours(2)));
    }

    #[tokio::test]
    async fn test_correct_password_still_blocked_inside_window() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        for _ in 0..6 {
            let _ = h.login(EMAIL, "wrong-pass").await;
        }

        h.clock.advance(Duration::minutes(119));
        assert!(matches!(h.login(EMAIL, PASSWORD).await, Err(AuthError::BlockedUser)));
        // Blocked attempts never reach the password comparison
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 6);
    }

    #[tokio::test]
    async fn test_expired_block_resets_counter_before_failed_attempt() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        for _ in 0..6 {
            let _ = h.login(EMAIL, "wrong-pass").await;
        }

        h.clock.advance(Duration::hours(2));
        assert!(matches!(h.login(EMAIL, "wrong-pass").await, Err(AuthError::WrongPassword)));
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 1);
    }

    #[tokio::test]
    async fn test_expired_block_allows_correct_password() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        for _ in 0..6 {
            let _ = h.login(EMAIL, "wrong-pass").await;
        }

        h.clock.advance(Duration::hours(2) + Duration::seconds(1));
        let out = h.login(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(out.account.login_attempts, 0);
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 0);
    }

    #[tokio::test]
    async fn test_excess_attempts_without_block_window_block_on_next_failure() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let mut account = h.repo.account_by_email(EMAIL).unwrap();
        account.login_attempts = 6;
        account.block_expires = None;
        h.repo.put_account(account);

        assert!(matches!(h.login(EMAIL, "wrong-pass").await, Err(AuthError::BlockedUser)));
        let account = h.repo.account_by_email(EMAIL).unwrap();
        assert_eq!(account.login_attempts, 7);
        assert_eq!(account.block_expires, Some(h.clock.now() + Duration::hours(2)));

        assert!(matches!(h.login(EMAIL, PASSWORD).await, Err(AuthError::BlockedUser)));
    }

    #[tokio::test]
    async fn test_block_is_written_with_the_crossing_increment() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        for _ in 0..5 {
            let _ = h.login(EMAIL, "wrong-pass").await;
        }
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().block_expires, None);

        let _ = h.login(EMAIL, "wrong-pass").await;
        let account = h.repo.account_by_email(EMAIL).unwrap();
        assert_eq!(account.login_attempts, 6);
        assert!(account.block_expires.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_all_counted() {
        const ATTEMPTS: usize = 24;
        let mut config = AuthConfig::for_tests();
        config.login_attempts_threshold = 100;
        let h = Harness::with_config(config);
        h.register(EMAIL, PASSWORD).await.unwrap();

        let login = Arc::new(LoginUseCase::new(
            h.state.repo.clone(),
            h.state.tokens.clone(),
            h.state.clock.clone(),
            h.state.config.clone(),
        ));
        let mut set = JoinSet::new();
        for _ in 0..ATTEMPTS {
            let login = login.clone();
            set.spawn(async move {
                let input = LoginInput {
                    email: EMAIL.into(),
                    password: "wrong-pass".into(),
                };
                login.execute(input, meta("10.0.0.1")).await
            });
        }
        while let Some(result) = set.join_next().await {
            assert!(matches!(result.unwrap(), Err(AuthError::WrongPassword)));
        }

        let account = h.repo.account_by_email(EMAIL).unwrap();
        assert_eq!(account.login_attempts, ATTEMPTS as i32);
    }

    #[tokio::test]
    async fn test_guard_writes_for_missing_account_fail() {
        let repo = InMemoryAuthRepository::new();
        let id = AccountId::new();
        let now = Utc::now();

        assert!(matches!(
            repo.record_failed_login(&id, 5, now).await,
            Err(AuthError::UserDoesNotExist)
        ));
        assert!(matches!(
            repo.reset_expired_block(&id, 5, now).await,
            Err(AuthError::UserDoesNotExist)
        ));
        assert!(matches!(
            repo.reset_login_attempts(&id).await,
            Err(AuthError::UserDoesNotExist)
        ));
    }

    #[tokio::test]
    async fn test_success_resets_counter_and_logs_access() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let _ = h.login(EMAIL, "wrong-pass").await;

        let out = h.login("  A@B.COM ", PASSWORD).await.unwrap();
        assert_eq!(out.account.login_attempts, 0);
        assert_eq!(h.state.tokens.resolve(&out.token).unwrap(), out.account.id);

        let log = h.repo.access_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].email.as_str(), EMAIL);
        assert_eq!(log[0].ip, "10.0.0.1");
        assert_eq!(log[0].browser, "Firefox 128");
        assert_eq!(log[0].country, "KE");
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_accounts_do_not_exist() {
        let h = Harness::new();
        assert!(matches!(h.login(EMAIL, PASSWORD).await, Err(AuthError::UserDoesNotExist)));

        h.register(EMAIL, PASSWORD).await.unwrap();
        let mut account = h.repo.account_by_email(EMAIL).unwrap();
        account.status = AccountStatus::Deleted;
        h.repo.put_account(account);
        assert!(matches!(h.login(EMAIL, PASSWORD).await, Err(AuthError::UserDoesNotExist)));
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();

        h.repo.fail_next_reads(2);
        assert!(h.login(EMAIL, PASSWORD).await.is_ok());

        h.repo.fail_next_reads(10);
        assert!(matches!(h.login(EMAIL, PASSWORD).await, Err(AuthError::StorageUnavailable)));
    }
}

#[cfg(test)]
mod verification_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_creates_unverified_account_and_sends_email() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();

        assert!(!out.account.verified);
        assert_eq!(out.account.role, AccountRole::User);
        assert_eq!(h.state.tokens.resolve(&out.token).unwrap(), out.account.id);

        h.wait_for_notifications(1).await;
        let sent = h.mailer().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, EMAIL);
        assert!(sent[0].1.body.contains(&format!("/verify/{}", out.account.verification)));
        assert_eq!(h.repo.notifications()[0].status, DeliveryStatus::Success);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_case_insensitively() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        assert!(matches!(
            h.register("A@b.Com", PASSWORD).await,
            Err(AuthError::EmailAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let h = Harness::new();
        assert!(matches!(
            h.register("not-an-email", PASSWORD).await,
            Err(AuthError::Validation(msg)) if msg == "EMAIL_IS_NOT_VALID"
        ));
        assert!(matches!(
            h.register(EMAIL, "1234").await,
            Err(AuthError::Validation(msg)) if msg.starts_with("PASSWORD_TOO_SHORT")
        ));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_registration() {
        let h = Harness::new();
        h.mailer().fail_with("smtp down");

        assert!(h.register(EMAIL, PASSWORD).await.is_ok());

        h.wait_for_notifications(1).await;
        let entry = &h.repo.notifications()[0];
        assert_eq!(entry.status, DeliveryStatus::Failed);
        assert_eq!(entry.error.as_deref(), Some("smtp down"));
    }

    #[tokio::test]
    async fn test_verification_token_verifies_exactly_once() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();
        let token = out.account.verification.clone();

        h.verify(&token).await.unwrap();
        assert!(h.repo.account_by_email(EMAIL).unwrap().verified);

        assert!(matches!(
            h.verify(&token).await,
            Err(AuthError::NotFoundOrAlreadyVerified)
        ));
        // The token value itself is kept
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().verification, token);
    }

    #[tokio::test]
    async fn test_unknown_verification_token() {
        let h = Harness::new();
        assert!(matches!(
            h.verify("does-not-exist").await,
            Err(AuthError::NotFoundOrAlreadyVerified)
        ));
    }
}

#[cfg(test)]
mod reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_forgot_unknown_email() {
        let h = Harness::new();
        assert!(matches!(h.forgot(EMAIL).await, Err(AuthError::UserDoesNotExist)));
    }

    #[tokio::test]
    async fn test_forgot_records_request_and_sends_link() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let token = h.forgot(EMAIL).await.unwrap();

        let requests = h.repo.reset_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].verification, token);
        assert!(!requests[0].used);
        assert_eq!(requests[0].requested_by, meta("10.0.0.2"));

        h.wait_for_notifications(2).await;
        let sent = h.mailer().sent();
        let reset = sent.iter().find(|(_, m)| m.subject.starts_with("Password recovery")).unwrap();
        assert!(reset.1.body.contains(&format!("/reset/{token}")));
    }

    #[tokio::test]
    async fn test_reset_token_is_consumed_exactly_once() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let token = h.forgot(EMAIL).await.unwrap();

        h.reset(&token, "first-new").await.unwrap();
        assert!(matches!(
            h.reset(&token, "second-new").await,
            Err(AuthError::NotFoundOrAlreadyUsed)
        ));

        let account = h.repo.account_by_email(EMAIL).unwrap();
        assert!(account.password.verify(&ClearTextPassword::for_comparison("first-new".into())));
        assert!(!account.password.verify(&ClearTextPassword::for_comparison("second-new".into())));

        let request = &h.repo.reset_requests()[0];
        assert!(request.used);
        assert_eq!(request.consumed_by, Some(meta("10.0.0.3")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_resets_consume_token_once() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let token = h.forgot(EMAIL).await.unwrap();

        let reset = Arc::new(ResetPasswordUseCase::new(
            h.state.repo.clone(),
            h.state.clock.clone(),
            h.state.config.clone(),
        ));
        let run = |password: &'static str| {
            let reset = reset.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let input = ResetPasswordInput {
                    token,
                    password: password.into(),
                };
                (password, reset.execute(input, meta("10.0.0.3")).await)
            })
        };
        let (first, second) = tokio::join!(run("first-new"), run("second-new"));
        let outcomes = [first.unwrap(), second.unwrap()];

        let winners: Vec<&str> = outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(p, _)| *p)
            .collect();
        assert_eq!(winners.len(), 1);
        assert!(outcomes
            .iter()
            .any(|(_, r)| matches!(r, Err(AuthError::NotFoundOrAlreadyUsed))));

        let account = h.repo.account_by_email(EMAIL).unwrap();
        let winner = ClearTextPassword::for_comparison(winners[0].into());
        assert!(account.password.verify(&winner));
    }

    #[tokio::test]
    async fn test_reset_keeps_login_attempts() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let _ = h.login(EMAIL, "wrong-pass").await;
        let token = h.forgot(EMAIL).await.unwrap();

        h.reset(&token, "first-new").await.unwrap();
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 1);
    }

    #[tokio::test]
    async fn test_reset_for_vanished_account_changes_nothing() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let token = h.forgot(EMAIL).await.unwrap();

        let mut account = h.repo.account_by_email(EMAIL).unwrap();
        account.status = AccountStatus::Deleted;
        h.repo.put_account(account);

        assert!(matches!(h.reset(&token, "first-new").await, Err(AuthError::NotFound)));
        assert!(!h.repo.reset_requests()[0].used);
    }

    #[tokio::test]
    async fn test_weak_password_leaves_token_usable() {
        let h = Harness::new();
        h.register(EMAIL, PASSWORD).await.unwrap();
        let token = h.forgot(EMAIL).await.unwrap();

        assert!(matches!(h.reset(&token, "abc").await, Err(AuthError::Validation(_))));
        assert!(h.reset(&token, "long-enough").await.is_ok());
    }
}

#[cfg(test)]
mod token_tests {
    use super::*;

    async fn refresh(h: &Harness, bearer: &str) -> AuthResult<String> {
        RefreshTokenUseCase::new(
            h.state.repo.clone(),
            h.state.tokens.clone(),
            h.state.clock.clone(),
            h.state.config.clone(),
        )
        .execute(bearer, meta("10.0.0.9"))
        .await
    }

    #[tokio::test]
    async fn test_refresh_issues_new_token_and_logs_access() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();

        let fresh = refresh(&h, &out.token).await.unwrap();
        assert_ne!(fresh, out.token);
        assert_eq!(h.state.tokens.resolve(&fresh).unwrap(), out.account.id);
        assert_eq!(h.repo.access_log()[0].ip, "10.0.0.9");
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();

        h.clock.advance(h.state.config.token_ttl);
        assert!(matches!(refresh(&h, &out.token).await, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_account() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();
        let mut account = out.account.clone();
        account.status = AccountStatus::Deleted;
        h.repo.put_account(account);

        assert!(matches!(refresh(&h, &out.token).await, Err(AuthError::UserDoesNotExist)));
    }

    #[tokio::test]
    async fn test_role_authorization() {
        let h = Harness::new();
        let out = h.register(EMAIL, PASSWORD).await.unwrap();
        let roles = RoleAuthorizationUseCase::new(h.state.repo.clone(), h.state.config.clone());

        assert!(roles.execute(&out.account.id, &AccountRole::ALL).await.is_ok());
        assert!(matches!(
            roles.execute(&out.account.id, &[AccountRole::Admin]).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            roles.execute(&crate::domain::value_object::AccountId::new(), &AccountRole::ALL).await,
            Err(AuthError::PrincipalNotFound)
        ));
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::application::Environment;
    use crate::auth_router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(
        h: &Harness,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = auth_router(h.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(h: &Harness, password: &str) -> (StatusCode, Value) {
        call(
            h,
            Method::POST,
            "/login",
            Some(json!({ "email": EMAIL, "password": password })),
            None,
        )
        .await
    }

    async fn register(h: &Harness) -> Value {
        let (status, body) = call(
            h,
            Method::POST,
            "/register",
            Some(json!({
                "name": "Ann",
                "email": EMAIL,
                "password": PASSWORD,
                "phone": "254700000000"
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_lockout_scenario_end_to_end() {
        let h = Harness::new();
        let body = register(&h).await;
        assert!(body["token"].is_string());

        for _ in 0..5 {
            let (status, body) = login(&h, "wrong-pass").await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(body["errors"]["msg"], "WRONG_PASSWORD");
        }
        let (status, body) = login(&h, "wrong-pass").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"]["msg"], "BLOCKED_USER");

        let (status, body) = login(&h, PASSWORD).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"]["msg"], "BLOCKED_USER");

        h.clock.advance(Duration::hours(2) + Duration::minutes(1));
        let (status, body) = login(&h, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
        assert_eq!(body["user"]["email"], EMAIL);
        assert_eq!(h.repo.account_by_email(EMAIL).unwrap().login_attempts, 0);
    }

    #[tokio::test]
    async fn test_register_response_shape() {
        let h = Harness::new();
        let body = register(&h).await;
        let user = &body["user"];
        assert_eq!(user["name"], "Ann");
        assert_eq!(user["email"], EMAIL);
        assert_eq!(user["phone"], "254700000000");
        assert_eq!(user["role"], "user");
        assert_eq!(user["verified"], false);
        // Test config exposes verification tokens
        assert!(user["verification"].is_string());
        assert!(user.get("password").is_none());

        let (status, body) = call(
            &h,
            Method::POST,
            "/register",
            Some(json!({
                "name": "Ann", "email": EMAIL, "password": PASSWORD, "phone": "1"
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["msg"], "EMAIL_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let h = Harness::new();
        let (status, body) =
            call(&h, Method::POST, "/login", Some(json!({ "email": EMAIL })), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["msg"], "MISSING");
    }

    #[tokio::test]
    async fn test_verify_and_reset_over_http() {
        let h = Harness::new();
        let body = register(&h).await;
        let verification = body["user"]["verification"].as_str().unwrap().to_string();

        let (status, body) =
            call(&h, Method::POST, "/verify", Some(json!({ "id": verification })), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "email": EMAIL, "verified": true }));

        let (status, body) =
            call(&h, Method::POST, "/verify", Some(json!({ "id": verification })), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["msg"], "NOT_FOUND_OR_ALREADY_VERIFIED");

        let (status, body) =
            call(&h, Method::POST, "/forgot", Some(json!({ "email": EMAIL })), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "RESET_EMAIL_SENT");
        let reset_token = body["verification"].as_str().unwrap().to_string();

        let reset = json!({ "id": reset_token, "password": "brand-new" });
        let (status, body) = call(&h, Method::POST, "/reset", Some(reset.clone()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "msg": "PASSWORD_CHANGED" }));

        let (status, body) = call(&h, Method::POST, "/reset", Some(reset), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["msg"], "NOT_FOUND_OR_ALREADY_USED");

        let (status, _) = login(&h, "brand-new").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_production_never_echoes_tokens() {
        let mut config = AuthConfig::for_tests();
        config.environment = Environment::Production;
        let h = Harness::with_config(config);

        let body = register(&h).await;
        assert!(body["user"].get("verification").is_none());

        let (status, body) =
            call(&h, Method::POST, "/forgot", Some(json!({ "email": EMAIL })), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("verification").is_none());
        assert_eq!(body["email"], EMAIL);
    }

    #[tokio::test]
    async fn test_refresh_status_codes() {
        let h = Harness::new();
        let body = register(&h).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, _) = call(&h, Method::GET, "/token", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&h, Method::GET, "/token", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"]["msg"], "BAD_TOKEN");

        let (status, body) = call(&h, Method::GET, "/token", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
        assert!(body.get("user").is_none());
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let h = Harness::new();
        let body = register(&h).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(&h, Method::GET, "/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"]["msg"], "UNAUTHORIZED");

        let (status, body) = call(&h, Method::GET, "/profile", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], EMAIL);

        let (status, body) = call(
            &h,
            Method::PATCH,
            "/profile",
            Some(json!({ "name": "Ann Marie" })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ann Marie");
        assert_eq!(body["phone"], "254700000000");
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = Harness::new();
        let body = register(&h).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &h,
            Method::POST,
            "/profile/changePassword",
            Some(json!({ "oldPassword": "not-mine", "newPassword": "brand-new" })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"]["msg"], "WRONG_PASSWORD");

        let (status, body) = call(
            &h,
            Method::POST,
            "/profile/changePassword",
            Some(json!({ "oldPassword": PASSWORD, "newPassword": "brand-new" })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "PASSWORD_CHANGED");

        let (status, _) = login(&h, "brand-new").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deleted_principal_is_rejected_by_role_check() {
        let h = Harness::new();
        let body = register(&h).await;
        let token = body["token"].as_str().unwrap().to_string();

        let mut account = h.repo.account_by_email(EMAIL).unwrap();
        account.status = AccountStatus::Deleted;
        h.repo.put_account(account);

        let (status, body) = call(&h, Method::GET, "/profile", None, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"]["msg"], "NOT_FOUND");
    }
}
