//! HTTP Handlers

use crate::application::config::WalletAuthConfig;
use crate::application::request_challenge::{RequestChallengeInput, RequestChallengeUseCase};
use crate::application::sweep::{SweepExpiredUseCase, SweepReport};
use crate::application::validate_session::ValidateSessionUseCase;
use crate::application::verify_and_issue::{VerifyAndIssueInput, VerifyAndIssueUseCase};
use crate::domain::repository::WalletAuthRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChallengeQuery, ChallengeResponse, SessionStatusResponse, VerifyRequest, VerifyResponse, iso8601,
};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use platform::client::{client_key, extract_bearer_token, extract_client_ip};
use platform::time::{Clock, SystemClock};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Shared state for wallet auth handlers
pub struct WalletAuthState<R>
where
    R: WalletAuthRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<WalletAuthConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R> Clone for WalletAuthState<R>
where
    R: WalletAuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R> WalletAuthState<R>
where
    R: WalletAuthRepository,
{
    pub fn new(repo: R, config: WalletAuthConfig) -> Self {
        Self::with_clock(repo, config, Arc::new(SystemClock))
    }

    pub fn with_clock(repo: R, config: WalletAuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            clock,
        }
    }

    pub fn validate_session_use_case(&self) -> ValidateSessionUseCase<R> {
        ValidateSessionUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
    }

    /// Run one expiry sweep
    pub async fn sweep(&self) -> AuthResult<SweepReport> {
        SweepExpiredUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
            .execute()
            .await
    }
}

/// Client IP: the peer address, or the forwarded hop when proxies are trusted
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<R> FromRequestParts<WalletAuthState<R>> for ClientIp
where
    R: WalletAuthRepository,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WalletAuthState<R>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientIp(extract_client_ip(
            &parts.headers,
            peer,
            state.config.trusted_proxy_hops,
        )))
    }
}

/// GET /auth/challenge
pub async fn request_challenge<R>(
    State(state): State<WalletAuthState<R>>,
    ClientIp(ip): ClientIp,
    Query(query): Query<ChallengeQuery>,
) -> AuthResult<Json<ChallengeResponse>>
where
    R: WalletAuthRepository,
{
    let use_case = RequestChallengeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case
        .execute(RequestChallengeInput {
            address: query.address.filter(|a| !a.trim().is_empty()),
            client_key: client_key(ip),
        })
        .await?;

    Ok(Json(ChallengeResponse {
        nonce: output.nonce.to_string(),
        message: output.message,
        issued_at: iso8601(output.issued_at_ms),
        expires_at: iso8601(output.expires_at_ms),
    }))
}

/// POST /auth/verify
pub async fn verify<R>(
    State(state): State<WalletAuthState<R>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> AuthResult<Json<VerifyResponse>>
where
    R: WalletAuthRepository,
{
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected verify body");
        AuthError::InvalidField("body".into())
    })?;

    let use_case =
        VerifyAndIssueUseCase::new(state.repo.clone(), state.config.clone(), state.clock.clone());

    let output = use_case
        .execute(VerifyAndIssueInput {
            message: req.message,
            signature: req.signature,
            address: req.address,
        })
        .await?;

    Ok(Json(VerifyResponse {
        token: output.token,
        address: output.address.to_checksum(),
        expires_at: iso8601(output.expires_at_ms),
    }))
}

/// GET /auth/session
///
/// Reports whether the bearer token (if any) is currently valid. Never
/// fails on a bad token.
pub async fn session_status<R>(
    State(state): State<WalletAuthState<R>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: WalletAuthRepository,
{
    let Ok(token) = extract_bearer_token(&headers) else {
        return Json(SessionStatusResponse::default());
    };

    match state.validate_session_use_case().execute(token).await {
        Ok(wallet) => Json(SessionStatusResponse {
            authenticated: true,
            address: Some(wallet.address.to_checksum()),
            expires_at: Some(iso8601(wallet.expires_at_ms)),
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Session status check failed");
            Json(SessionStatusResponse::default())
        }
    }
}

/// POST /auth/logout
pub async fn logout<R>(
    State(state): State<WalletAuthState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: WalletAuthRepository,
{
    let token = extract_bearer_token(&headers).map_err(|_| AuthError::MissingCredentials)?;

    state.validate_session_use_case().sign_out(token).await?;

    Ok(StatusCode::NO_CONTENT)
}
