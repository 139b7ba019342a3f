//! Session Tokens
//!
//! Self-contained bearer tokens: `base64url(payload) "." base64url(tag)`
//! where the payload is JSON claims and the tag is HMAC-SHA256 of the
//! encoded payload under the server's session secret. Validation needs no
//! storage lookup.

use crate::domain::entities::WalletSession;
use crate::domain::value_objects::WalletAddress;
use kernel::id::WalletSessionId;
use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub sub: WalletAddress,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn session_id(&self) -> WalletSessionId {
        WalletSessionId::from_uuid(self.sid)
    }
}

impl From<&WalletSession> for SessionClaims {
    fn from(session: &WalletSession) -> Self {
        Self {
            sid: session.id.into_uuid(),
            sub: session.address,
            iat: session.issued_at_ms,
            exp: session.expires_at_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("session token expired")]
    Expired,
    #[error("session token invalid")]
    Invalid,
}

/// Issues and validates session tokens with one secret
#[derive(Clone)]
pub struct SessionSigner {
    secret: [u8; 32],
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Mint the token for a session
    pub fn issue(&self, session: &WalletSession) -> Result<String, serde_json::Error> {
        let payload = serde_json::to_vec(&SessionClaims::from(session))?;
        let payload_b64 = to_base64_url(&payload);
        let tag = hmac_sha256(&self.secret, payload_b64.as_bytes());
        Ok(format!("{}.{}", payload_b64, to_base64_url(&tag)))
    }

    /// Validate a token at `now_ms`
    ///
    /// The tag is checked before the payload is decoded. A token is
    /// accepted only while `now_ms < exp`.
    pub fn validate(&self, token: &str, now_ms: i64) -> Result<SessionClaims, TokenError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(TokenError::Invalid)?;
        let tag = from_base64_url(tag_b64).map_err(|_| TokenError::Invalid)?;

        if !verify_hmac_sha256(&self.secret, payload_b64.as_bytes(), &tag) {
            return Err(TokenError::Invalid);
        }

        let payload = from_base64_url(payload_b64).map_err(|_| TokenError::Invalid)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Invalid)?;

        if claims.exp <= now_ms {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now_ms: i64) -> WalletSession {
        let address = WalletAddress::parse("0x2c7536E3605D9C16a7a3D7b1898e529396a65c23").unwrap();
        WalletSession::new(address, now_ms, 15 * 60_000)
    }

    #[test]
    fn test_issue_and_validate() {
        let signer = SessionSigner::new([9u8; 32]);
        let s = session(1_000);
        let token = signer.issue(&s).unwrap();

        let claims = signer.validate(&token, 2_000).unwrap();
        assert_eq!(claims.sub, s.address);
        assert_eq!(claims.session_id(), s.id);
        assert_eq!(claims.exp, s.expires_at_ms);
    }

    #[test]
    fn test_validate_expiry_boundary() {
        let signer = SessionSigner::new([9u8; 32]);
        let s = session(0);
        let token = signer.issue(&s).unwrap();

        assert!(signer.validate(&token, s.expires_at_ms - 1).is_ok());
        assert_eq!(
            signer.validate(&token, s.expires_at_ms),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_every_bit_flip_is_rejected() {
        let signer = SessionSigner::new([9u8; 32]);
        let token = signer.issue(&session(0)).unwrap();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[i] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                assert_eq!(
                    signer.validate(&tampered, 1),
                    Err(TokenError::Invalid),
                    "flip at byte {i} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = SessionSigner::new([1u8; 32]).issue(&session(0)).unwrap();
        assert_eq!(
            SessionSigner::new([2u8; 32]).validate(&token, 1),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            SessionSigner::new([1u8; 32]).validate("garbage", 1),
            Err(TokenError::Invalid)
        );
    }
}
