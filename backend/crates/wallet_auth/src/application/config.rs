//! Application Configuration
//!
//! Configuration for the wallet sign-in application layer.

use crate::domain::entities::Challenge;
use crate::domain::message::ChallengeFields;
use crate::domain::token::SessionSigner;
use crate::domain::value_objects::WalletAddress;
use crate::error::{AuthError, AuthResult};
use platform::rate_limit::RateLimitConfig;
use std::fmt;
use std::time::Duration;

/// Only version 1 of the sign-in message format exists
pub const MESSAGE_VERSION: &str = "1";

/// Upper bound for challenge and session lifetimes
pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// 32-byte HMAC key for session tokens; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret([u8; 32]);

impl SessionSecret {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        Self(platform::crypto::random_secret())
    }

    /// Decode from standard base64 (exactly 32 bytes)
    pub fn from_base64(s: &str) -> AuthResult<Self> {
        let bytes = platform::crypto::from_base64(s.trim())
            .map_err(|_| AuthError::InvalidField("session_secret".into()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AuthError::InvalidField("session_secret".into()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(..)")
    }
}

/// Wallet auth application configuration
#[derive(Debug, Clone)]
pub struct WalletAuthConfig {
    /// Authority the sign-in is scoped to (`host[:port]`)
    pub domain: String,
    /// Origin URI shown in the message
    pub uri: String,
    /// Human-readable statement shown in the wallet
    pub statement: String,
    /// Message format version
    pub version: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Nonce entropy in bytes
    pub nonce_bytes_len: usize,
    /// Challenge TTL
    pub challenge_ttl: Duration,
    /// Session TTL
    pub session_ttl: Duration,
    /// Interval of the background expiry sweep
    pub sweep_interval: Duration,
    /// Per-client challenge request limit
    pub rate_limit: RateLimitConfig,
    /// Reverse proxies that append to `X-Forwarded-For`; 0 keys clients by peer address
    pub trusted_proxy_hops: usize,
    /// Session secret key for HMAC signing
    pub session_secret: SessionSecret,
}

impl Default for WalletAuthConfig {
    fn default() -> Self {
        Self {
            domain: "localhost:3000".to_string(),
            uri: "http://localhost:3000".to_string(),
            statement: "Sign in with your wallet to continue.".to_string(),
            version: MESSAGE_VERSION.to_string(),
            chain_id: 1,
            nonce_bytes_len: 16,
            challenge_ttl: Duration::from_secs(5 * 60),
            session_ttl: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(60),
            rate_limit: RateLimitConfig::default(),
            trusted_proxy_hops: 0,
            session_secret: SessionSecret::new([0u8; 32]),
        }
    }
}

impl WalletAuthConfig {
    /// Create config with a random session secret
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: SessionSecret::random(),
            ..Default::default()
        }
    }

    /// Create config for development (random secret, relaxed rate limit)
    pub fn development() -> Self {
        Self {
            rate_limit: RateLimitConfig::new(1_000, 60),
            ..Self::with_random_secret()
        }
    }

    pub fn challenge_ttl_ms(&self) -> i64 {
        duration_ms(self.challenge_ttl)
    }

    pub fn session_ttl_ms(&self) -> i64 {
        duration_ms(self.session_ttl)
    }

    /// Reject settings that would produce unusable challenges or sessions
    pub fn validate(&self) -> AuthResult<()> {
        if self.nonce_bytes_len < 8 {
            return Err(AuthError::InvalidField("nonce_bytes_len".into()));
        }
        if self.challenge_ttl.is_zero() || self.challenge_ttl > MAX_TTL {
            return Err(AuthError::InvalidField("challenge_ttl".into()));
        }
        if self.session_ttl.is_zero() || self.session_ttl > MAX_TTL {
            return Err(AuthError::InvalidField("session_ttl".into()));
        }
        if self.rate_limit.window.is_zero() {
            return Err(AuthError::InvalidField("rate_limit.window".into()));
        }
        // Renders a probe message so bad domain/uri/statement fail at startup
        let probe = Challenge::issue(None, self.nonce_bytes_len, 0, self.challenge_ttl_ms());
        self.challenge_fields(WalletAddress::from_bytes([0u8; 20]), &probe)
            .build()
            .map(|_| ())
    }

    /// Message fields for a stored challenge and the address it is for
    pub fn challenge_fields(&self, address: WalletAddress, challenge: &Challenge) -> ChallengeFields {
        ChallengeFields {
            domain: self.domain.clone(),
            address,
            statement: self.statement.clone(),
            uri: self.uri.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            nonce: challenge.nonce.clone(),
            issued_at_ms: challenge.issued_at_ms,
            expires_at_ms: challenge.expires_at_ms,
        }
    }

    pub fn signer(&self) -> SessionSigner {
        SessionSigner::new(*self.session_secret.as_bytes())
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
