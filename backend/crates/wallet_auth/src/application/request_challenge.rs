//! Request Challenge Use Case

use crate::application::config::WalletAuthConfig;
use crate::domain::entities::Challenge;
use crate::domain::repository::ChallengeRepository;
use crate::domain::value_objects::{Nonce, WalletAddress};
use crate::error::{AuthError, AuthResult};
use platform::rate_limit::RateLimitStore;
use platform::time::Clock;
use std::sync::Arc;

/// Input DTO for request challenge
#[derive(Debug, Clone, Default)]
pub struct RequestChallengeInput {
    /// Address the client intends to sign with
    pub address: Option<String>,
    /// Rate-limit bucket (client IP)
    pub client_key: String,
}

/// Output DTO for request challenge
#[derive(Debug, Clone)]
pub struct RequestChallengeOutput {
    pub nonce: Nonce,
    /// Canonical message to sign; present when an address was given
    pub message: Option<String>,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

/// Request Challenge Use Case
pub struct RequestChallengeUseCase<C, R>
where
    C: ChallengeRepository,
    R: RateLimitStore,
{
    challenge_repo: Arc<C>,
    rate_limit_store: Arc<R>,
    config: Arc<WalletAuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, R> RequestChallengeUseCase<C, R>
where
    C: ChallengeRepository,
    R: RateLimitStore,
{
    pub fn new(
        challenge_repo: Arc<C>,
        rate_limit_store: Arc<R>,
        config: Arc<WalletAuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenge_repo,
            rate_limit_store,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: RequestChallengeInput) -> AuthResult<RequestChallengeOutput> {
        let now_ms = self.clock.now_ms();

        // Check rate limit
        let limit = self
            .rate_limit_store
            .check_and_increment(&input.client_key, &self.config.rate_limit, now_ms)
            .await
            .map_err(|e| AuthError::Internal(format!("rate limit store: {e}")))?;
        if !limit.allowed {
            tracing::warn!(
                client = %input.client_key,
                reset_at_ms = limit.reset_at_ms,
                "Challenge rate limit hit"
            );
            return Err(AuthError::RateLimitExceeded);
        }

        let address = input
            .address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()
            .map_err(|_| AuthError::InvalidField("address".into()))?;

        let challenge = Challenge::issue(
            address,
            self.config.nonce_bytes_len,
            now_ms,
            self.config.challenge_ttl_ms(),
        );

        let message = address
            .map(|a| self.config.challenge_fields(a, &challenge).build())
            .transpose()?;

        // A newer challenge for the same address replaces the pending one
        self.challenge_repo.issue(&challenge).await?;

        tracing::info!(
            nonce = %challenge.nonce,
            address = ?address.map(|a| a.to_checksum()),
            expires_at_ms = challenge.expires_at_ms,
            "Issued challenge"
        );

        Ok(RequestChallengeOutput {
            nonce: challenge.nonce,
            message,
            issued_at_ms: challenge.issued_at_ms,
            expires_at_ms: challenge.expires_at_ms,
        })
    }
}
