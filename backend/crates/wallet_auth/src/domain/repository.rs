//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use crate::domain::entities::Challenge;
use crate::domain::value_objects::Nonce;
use crate::error::AuthResult;
use kernel::id::WalletSessionId;
use platform::rate_limit::RateLimitStore;

/// Result of an atomic consume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The challenge was pending and has now been removed
    Consumed(Challenge),
    /// The challenge existed but had expired; it has been removed
    Expired,
    /// Never issued, already consumed, superseded, or swept
    NotFound,
}

/// Challenge repository trait
#[trait_variant::make(ChallengeRepository: Send)]
pub trait LocalChallengeRepository {
    /// Store a new challenge, replacing any pending challenge bound to the
    /// same address
    async fn issue(&self, challenge: &Challenge) -> AuthResult<()>;

    /// Remove and return a challenge in one atomic step
    ///
    /// Concurrent calls for the same nonce see at most one `Consumed`.
    async fn consume(&self, nonce: &Nonce, now_ms: i64) -> AuthResult<ConsumeOutcome>;

    /// Delete challenges expired at `now_ms`; returns how many were removed
    async fn sweep_challenges(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Revoked-session repository trait
#[trait_variant::make(RevocationRepository: Send)]
pub trait LocalRevocationRepository {
    /// Remember a signed-out session until its token would expire anyway
    async fn revoke(&self, session_id: WalletSessionId, expires_at_ms: i64) -> AuthResult<()>;

    async fn is_revoked(&self, session_id: WalletSessionId) -> AuthResult<bool>;

    /// Forget revocations whose tokens have expired
    async fn sweep_revocations(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait WalletAuthRepository:
    ChallengeRepository + RevocationRepository + RateLimitStore + Clone + Send + Sync + 'static
{
}

impl<T> WalletAuthRepository for T where
    T: ChallengeRepository + RevocationRepository + RateLimitStore + Clone + Send + Sync + 'static
{
}
