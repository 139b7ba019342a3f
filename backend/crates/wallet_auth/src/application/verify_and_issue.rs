//! Verify And Issue Use Case
//!
//! Exchanges a signed challenge for a session token:
//! 1. parse the canonical message and take its nonce
//! 2. consume the nonce (one-shot, even if a later check fails)
//! 3. re-render the message from the stored challenge and compare bytes
//! 4. recover the signer and compare it to the claimed address
//! 5. mint the session token

use crate::application::config::WalletAuthConfig;
use crate::domain::entities::WalletSession;
use crate::domain::message::ChallengeFields;
use crate::domain::repository::{ChallengeRepository, ConsumeOutcome};
use crate::domain::signature::{SignatureError, verify_signature};
use crate::domain::value_objects::WalletAddress;
use crate::error::{AuthError, AuthResult};
use kernel::id::WalletSessionId;
use platform::crypto::constant_time_eq;
use platform::time::Clock;
use std::sync::Arc;

/// Input DTO for verify and issue
#[derive(Debug, Clone)]
pub struct VerifyAndIssueInput {
    pub message: String,
    /// Hex `r || s || v`
    pub signature: String,
    pub address: String,
}

/// Output DTO for verify and issue
#[derive(Debug, Clone)]
pub struct VerifyAndIssueOutput {
    pub session_id: WalletSessionId,
    pub address: WalletAddress,
    pub token: String,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

/// Verify And Issue Use Case
pub struct VerifyAndIssueUseCase<C>
where
    C: ChallengeRepository,
{
    challenge_repo: Arc<C>,
    config: Arc<WalletAuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<C> VerifyAndIssueUseCase<C>
where
    C: ChallengeRepository,
{
    pub fn new(challenge_repo: Arc<C>, config: Arc<WalletAuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            challenge_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: VerifyAndIssueInput) -> AuthResult<VerifyAndIssueOutput> {
        let claimed = WalletAddress::parse(input.address.trim())
            .map_err(|_| AuthError::InvalidField("address".into()))?;
        let signed = ChallengeFields::parse(&input.message)?;

        let now_ms = self.clock.now_ms();

        let challenge = match self.challenge_repo.consume(&signed.nonce, now_ms).await? {
            ConsumeOutcome::Consumed(challenge) => challenge,
            ConsumeOutcome::Expired => {
                tracing::info!(nonce = %signed.nonce, "Challenge expired before verification");
                return Err(AuthError::ChallengeInvalid);
            }
            ConsumeOutcome::NotFound => {
                tracing::info!(nonce = %signed.nonce, "Challenge not found or already used");
                return Err(AuthError::ChallengeInvalid);
            }
        };

        // A challenge bound at request time only signs in that address
        let subject = challenge.bound_address.unwrap_or(claimed);
        let expected = self.config.challenge_fields(subject, &challenge).build()?;
        if subject != claimed || !constant_time_eq(expected.as_bytes(), input.message.as_bytes()) {
            tracing::warn!(
                nonce = %challenge.nonce,
                claimed = %claimed,
                bound = ?challenge.bound_address.map(|a| a.to_checksum()),
                "Signed message differs from issued challenge"
            );
            return Err(AuthError::MessageMismatch);
        }

        verify_signature(&input.message, &input.signature, &claimed).map_err(|e| match e {
            SignatureError::Malformed(reason) => {
                tracing::debug!(reason, "Malformed signature");
                AuthError::MalformedSignature
            }
            SignatureError::Mismatch => {
                tracing::warn!(
                    address = %claimed,
                    nonce = %challenge.nonce,
                    "Signature does not match address"
                );
                AuthError::SignatureInvalid
            }
        })?;

        let session = WalletSession::new(claimed, now_ms, self.config.session_ttl_ms());
        let token = self
            .config
            .signer()
            .issue(&session)
            .map_err(|e| AuthError::Internal(format!("session token encoding: {e}")))?;

        tracing::info!(
            session_id = %session.id,
            address = %session.address,
            expires_at_ms = session.expires_at_ms,
            "Wallet signed in"
        );

        Ok(VerifyAndIssueOutput {
            session_id: session.id,
            address: session.address,
            token,
            issued_at_ms: session.issued_at_ms,
            expires_at_ms: session.expires_at_ms,
        })
    }
}
