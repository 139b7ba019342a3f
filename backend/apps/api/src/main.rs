//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are rendered by
//! `wallet_auth::AuthError`.

mod settings;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;
use settings::ServerSettings;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_auth::{
    AuthenticatedWallet, MemoryWalletAuthRepository, PgWalletAuthRepository, WalletAuthConfig,
    WalletAuthRepository, WalletAuthState, require_wallet_session, wallet_auth_router_with_state,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,wallet_auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = |key: &str| std::env::var(key).ok();
    let settings = ServerSettings::from_lookup(env)?;
    let config = settings::wallet_auth_config(env, cfg!(debug_assertions))?;

    tracing::info!(
        domain = %config.domain,
        chain_id = config.chain_id,
        challenge_ttl_secs = config.challenge_ttl.as_secs(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "Wallet auth configured"
    );

    match settings.database_url.clone() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await
                .context("failed to connect to DATABASE_URL")?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;

            tracing::info!("Migrations completed");

            serve(PgWalletAuthRepository::new(pool), config, &settings).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, challenges are kept in memory");
            serve(MemoryWalletAuthRepository::new(), config, &settings).await
        }
    }
}

async fn serve<R>(repo: R, config: WalletAuthConfig, settings: &ServerSettings) -> anyhow::Result<()>
where
    R: WalletAuthRepository,
{
    let state = WalletAuthState::new(repo, config);
    spawn_sweeper(state.clone());

    let app = build_app(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&settings.frontend_origins));

    tracing::info!("Listening on {}", settings.bind_addr);

    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// `/auth/*` sign-in routes plus the session-protected `/api/*` routes
fn build_app<R>(state: WalletAuthState<R>) -> Router
where
    R: WalletAuthRepository,
{
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_wallet_session::<R>,
        ));

    Router::new()
        .nest("/auth", wallet_auth_router_with_state(state))
        .nest("/api", protected)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    address: String,
    session_id: String,
    expires_at_ms: i64,
}

/// GET /api/me
async fn me(Extension(wallet): Extension<AuthenticatedWallet>) -> Json<MeResponse> {
    Json(MeResponse {
        address: wallet.address.to_checksum(),
        session_id: wallet.session_id.to_string(),
        expires_at_ms: wallet.expires_at_ms,
    })
}

/// Periodically drop expired challenges, revocations and rate-limit windows.
/// The first tick runs immediately, so startup also cleans up.
fn spawn_sweeper<R>(state: WalletAuthState<R>)
where
    R: WalletAuthRepository,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = state.sweep().await {
                tracing::warn!(error = %e, "Sweep failed, will retry");
            }
        }
    });
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
