//! API Server Entry Point
//!
//! Loads configuration, connects to PostgreSQL, runs migrations and serves
//! the auth endpoints together with the admin `/users` resource.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError`.

mod config;
mod routes;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::{AuthAppState, Mailer, PgAuthRepository};
use axum::http::{HeaderValue, Method, header};
use platform::clock::SystemClock;
use query::PgStore;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,query=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        environment = %config.auth.environment,
        bind_addr = %config.bind_addr,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_timeout)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    let mailer = Mailer::from_env()?;
    let auth_state = AuthAppState::new(
        PgAuthRepository::new(pool.clone()),
        config.auth.clone(),
        Arc::new(SystemClock),
        mailer,
    )?;
    let store = Arc::new(PgStore::new(pool));

    let allowed_origins: Vec<HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    let app = routes::app_router(auth_state, store).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
