//! Wallet Session Middleware

use crate::domain::entities::AuthenticatedWallet;
use crate::domain::repository::WalletAuthRepository;
use crate::error::AuthError;
use crate::presentation::handlers::WalletAuthState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

/// Middleware that requires a valid wallet session
///
/// On success the request carries an [`AuthenticatedWallet`] extension.
/// Missing, tampered, revoked or expired tokens get `401` with
/// `WWW-Authenticate: Bearer`.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/me", get(me))
///     .route_layer(axum::middleware::from_fn_with_state(
///         state.clone(),
///         require_wallet_session::<R>,
///     ));
/// ```
pub async fn require_wallet_session<R>(
    State(state): State<WalletAuthState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: WalletAuthRepository,
{
    let token = extract_bearer_token(req.headers()).map_err(|e| {
        tracing::debug!(reason = %e, "No wallet session credentials");
        AuthError::MissingCredentials
    })?;

    let wallet: AuthenticatedWallet = state.validate_session_use_case().execute(token).await?;

    tracing::debug!(
        session_id = %wallet.session_id,
        address = %wallet.address,
        "Wallet session accepted"
    );
    req.extensions_mut().insert(wallet);

    Ok(next.run(req).await)
}
