//! Wallet Auth Router

use crate::application::config::WalletAuthConfig;
use crate::domain::repository::WalletAuthRepository;
use crate::presentation::handlers::{self, WalletAuthState};
use axum::{
    Router,
    routing::{get, post},
};

/// Create the wallet auth router for any repository implementation
pub fn wallet_auth_router<R>(repo: R, config: WalletAuthConfig) -> Router
where
    R: WalletAuthRepository,
{
    wallet_auth_router_with_state(WalletAuthState::new(repo, config))
}

/// Create the wallet auth router over existing state, so the same state
/// can also back [`require_wallet_session`](crate::presentation::middleware::require_wallet_session)
pub fn wallet_auth_router_with_state<R>(state: WalletAuthState<R>) -> Router
where
    R: WalletAuthRepository,
{
    Router::new()
        .route("/challenge", get(handlers::request_challenge::<R>))
        .route("/verify", post(handlers::verify::<R>))
        .route("/session", get(handlers::session_status::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .with_state(state)
}
