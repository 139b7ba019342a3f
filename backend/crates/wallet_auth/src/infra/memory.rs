//! In-Memory Repository Implementation
//!
//! Single-process store used when no database is configured. Every
//! operation holds one mutex for its whole check-and-mutate step, so
//! consume is atomic with respect to issue, other consumes and sweeps.

use crate::domain::entities::Challenge;
use crate::domain::repository::{ChallengeRepository, ConsumeOutcome, RevocationRepository};
use crate::domain::value_objects::{Nonce, WalletAddress};
use crate::error::AuthResult;
use kernel::id::WalletSessionId;
use platform::rate_limit::{
    MemoryRateLimitStore, RateLimitConfig, RateLimitError, RateLimitResult, RateLimitStore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ChallengeTable {
    by_nonce: HashMap<Nonce, Challenge>,
    /// Pending nonce per bound address
    by_address: HashMap<WalletAddress, Nonce>,
}

impl ChallengeTable {
    fn remove(&mut self, nonce: &Nonce) -> Option<Challenge> {
        let challenge = self.by_nonce.remove(nonce)?;
        if let Some(address) = challenge.bound_address {
            if self.by_address.get(&address) == Some(nonce) {
                self.by_address.remove(&address);
            }
        }
        Some(challenge)
    }
}

/// In-memory repository; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryWalletAuthRepository {
    challenges: Arc<Mutex<ChallengeTable>>,
    revoked: Arc<Mutex<HashMap<WalletSessionId, i64>>>,
    rate_limits: Arc<MemoryRateLimitStore>,
}

impl MemoryWalletAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn challenges(&self) -> MutexGuard<'_, ChallengeTable> {
        self.challenges.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn revoked(&self) -> MutexGuard<'_, HashMap<WalletSessionId, i64>> {
        self.revoked.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of challenges currently stored
    pub fn pending_challenges(&self) -> usize {
        self.challenges().by_nonce.len()
    }
}

impl ChallengeRepository for MemoryWalletAuthRepository {
    async fn issue(&self, challenge: &Challenge) -> AuthResult<()> {
        let mut table = self.challenges();

        if let Some(address) = challenge.bound_address {
            if let Some(prior) = table.by_address.insert(address, challenge.nonce.clone()) {
                table.by_nonce.remove(&prior);
                tracing::debug!(address = %address, nonce = %prior, "Superseded pending challenge");
            }
        }
        table
            .by_nonce
            .insert(challenge.nonce.clone(), challenge.clone());

        Ok(())
    }

    async fn consume(&self, nonce: &Nonce, now_ms: i64) -> AuthResult<ConsumeOutcome> {
        let mut table = self.challenges();

        Ok(match table.remove(nonce) {
            Some(challenge) if challenge.is_expired_at(now_ms) => ConsumeOutcome::Expired,
            Some(challenge) => ConsumeOutcome::Consumed(challenge),
            None => ConsumeOutcome::NotFound,
        })
    }

    async fn sweep_challenges(&self, now_ms: i64) -> AuthResult<u64> {
        let mut table = self.challenges();

        let expired: Vec<Nonce> = table
            .by_nonce
            .values()
            .filter(|c| c.is_expired_at(now_ms))
            .map(|c| c.nonce.clone())
            .collect();
        for nonce in &expired {
            table.remove(nonce);
        }

        Ok(expired.len() as u64)
    }
}

impl RevocationRepository for MemoryWalletAuthRepository {
    async fn revoke(&self, session_id: WalletSessionId, expires_at_ms: i64) -> AuthResult<()> {
        self.revoked().insert(session_id, expires_at_ms);
        Ok(())
    }

    async fn is_revoked(&self, session_id: WalletSessionId) -> AuthResult<bool> {
        Ok(self.revoked().contains_key(&session_id))
    }

    async fn sweep_revocations(&self, now_ms: i64) -> AuthResult<u64> {
        let mut revoked = self.revoked();
        let before = revoked.len();
        revoked.retain(|_, expires_at_ms| *expires_at_ms > now_ms);
        Ok((before - revoked.len()) as u64)
    }
}

impl RateLimitStore for MemoryWalletAuthRepository {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError> {
        self.rate_limits
            .check_and_increment(key, config, now_ms)
            .await
    }

    async fn sweep(&self, config: &RateLimitConfig, now_ms: i64) -> Result<u64, RateLimitError> {
        self.rate_limits.sweep(config, now_ms).await
    }
}
