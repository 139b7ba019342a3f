//! Domain Entities
//!
//! Core business entities for wallet sign-in.

use crate::domain::value_objects::{Nonce, WalletAddress};
use kernel::id::WalletSessionId;

/// Challenge entity - a single-use nonce handed to a client to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub nonce: Nonce,
    /// Address the challenge was requested for, if any
    pub bound_address: Option<WalletAddress>,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

impl Challenge {
    /// Create a new challenge with a fresh random nonce
    pub fn issue(
        bound_address: Option<WalletAddress>,
        nonce_bytes_len: usize,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Self {
        Self {
            nonce: Nonce::generate(nonce_bytes_len),
            bound_address,
            issued_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    /// A challenge is never accepted at or after `expires_at_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// WalletSession entity - minted after a verified signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub id: WalletSessionId,
    pub address: WalletAddress,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

impl WalletSession {
    pub fn new(address: WalletAddress, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            id: WalletSessionId::new(),
            address,
            issued_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Identity attached to requests that passed session validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWallet {
    pub address: WalletAddress,
    pub session_id: WalletSessionId,
    pub expires_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_expiry_boundary() {
        let challenge = Challenge::issue(None, 16, 1_000, 500);
        assert_eq!(challenge.expires_at_ms, 1_500);
        assert!(!challenge.is_expired_at(1_499));
        assert!(challenge.is_expired_at(1_500));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let address = WalletAddress::from_bytes([7u8; 20]);
        let a = WalletSession::new(address, 0, 60_000);
        let b = WalletSession::new(address, 0, 60_000);
        assert_ne!(a.id, b.id);
        assert!(!a.is_expired_at(59_999));
        assert!(a.is_expired_at(60_000));
    }

    #[test]
    fn test_expiry_saturates_instead_of_overflowing() {
        let address = WalletAddress::from_bytes([7u8; 20]);
        let session = WalletSession::new(address, 1_700_000_000_000, i64::MAX);
        assert_eq!(session.expires_at_ms, i64::MAX);
        assert!(!session.is_expired_at(1_700_000_000_000));
    }
}
