//! Validate Session Use Case
//!
//! Guard for protected operations, plus sign-out. Validation never touches
//! the challenge store.

use crate::application::config::WalletAuthConfig;
use crate::domain::entities::AuthenticatedWallet;
use crate::domain::repository::RevocationRepository;
use crate::domain::token::{SessionClaims, TokenError};
use crate::error::{AuthError, AuthResult};
use platform::time::Clock;
use std::sync::Arc;

/// Validate Session Use Case
pub struct ValidateSessionUseCase<V>
where
    V: RevocationRepository,
{
    revocation_repo: Arc<V>,
    config: Arc<WalletAuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<V> ValidateSessionUseCase<V>
where
    V: RevocationRepository,
{
    pub fn new(revocation_repo: Arc<V>, config: Arc<WalletAuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            revocation_repo,
            config,
            clock,
        }
    }

    /// Check token integrity and expiry, then the revocation list
    pub async fn execute(&self, token: &str) -> AuthResult<AuthenticatedWallet> {
        let claims = self.verify_token(token)?;
        let session_id = claims.session_id();

        if self.revocation_repo.is_revoked(session_id).await? {
            tracing::debug!(session_id = %session_id, "Revoked session presented");
            return Err(AuthError::SessionInvalid);
        }

        Ok(AuthenticatedWallet {
            address: claims.sub,
            session_id,
            expires_at_ms: claims.exp,
        })
    }

    /// Revoke the session behind `token` until it would have expired
    pub async fn sign_out(&self, token: &str) -> AuthResult<()> {
        let claims = self.verify_token(token)?;
        let session_id = claims.session_id();

        self.revocation_repo.revoke(session_id, claims.exp).await?;

        tracing::info!(session_id = %session_id, address = %claims.sub, "Wallet signed out");
        Ok(())
    }

    fn verify_token(&self, token: &str) -> AuthResult<SessionClaims> {
        self.config
            .signer()
            .validate(token, self.clock.now_ms())
            .map_err(|e| match e {
                TokenError::Expired => AuthError::SessionExpired,
                TokenError::Invalid => AuthError::SessionInvalid,
            })
    }
}
