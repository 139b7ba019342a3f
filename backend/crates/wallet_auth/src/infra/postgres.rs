//! PostgreSQL Repository Implementations

use crate::domain::entities::Challenge;
use crate::domain::repository::{ChallengeRepository, ConsumeOutcome, RevocationRepository};
use crate::domain::value_objects::{Nonce, WalletAddress};
use crate::error::{AuthError, AuthResult};
use kernel::id::WalletSessionId;
use platform::rate_limit::{RateLimitConfig, RateLimitError, RateLimitResult, RateLimitStore};
use sqlx::PgPool;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgWalletAuthRepository {
    pool: PgPool,
}

impl PgWalletAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ChallengeRepository for PgWalletAuthRepository {
    async fn issue(&self, challenge: &Challenge) -> AuthResult<()> {
        // The partial unique index on bound_address makes this a replace
        // for address-bound challenges and a plain insert otherwise
        sqlx::query(
            r#"
            INSERT INTO wallet_auth_challenges (
                nonce,
                bound_address,
                issued_at_ms,
                expires_at_ms
            ) VALUES ($1, $2, $3, $4)
            ON CONFLICT (bound_address) WHERE bound_address IS NOT NULL
            DO UPDATE SET
                nonce = EXCLUDED.nonce,
                issued_at_ms = EXCLUDED.issued_at_ms,
                expires_at_ms = EXCLUDED.expires_at_ms
            "#,
        )
        .bind(challenge.nonce.as_str())
        .bind(challenge.bound_address.map(|a| a.to_lowercase_hex()))
        .bind(challenge.issued_at_ms)
        .bind(challenge.expires_at_ms)
        .execute(&self.pool)
        .await?;

        tracing::debug!(nonce = %challenge.nonce, "Challenge stored");
        Ok(())
    }

    async fn consume(&self, nonce: &Nonce, now_ms: i64) -> AuthResult<ConsumeOutcome> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            DELETE FROM wallet_auth_challenges
            WHERE nonce = $1
            RETURNING
                nonce,
                bound_address,
                issued_at_ms,
                expires_at_ms
            "#,
        )
        .bind(nonce.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(ConsumeOutcome::NotFound);
        };

        let challenge = row.into_challenge()?;
        if challenge.is_expired_at(now_ms) {
            Ok(ConsumeOutcome::Expired)
        } else {
            Ok(ConsumeOutcome::Consumed(challenge))
        }
    }

    async fn sweep_challenges(&self, now_ms: i64) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM wallet_auth_challenges WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

impl RevocationRepository for PgWalletAuthRepository {
    async fn revoke(&self, session_id: WalletSessionId, expires_at_ms: i64) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_auth_revoked_sessions (session_id, expires_at_ms)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(session_id.into_uuid())
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, session_id: WalletSessionId) -> AuthResult<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM wallet_auth_revoked_sessions WHERE session_id = $1)",
        )
        .bind(session_id.into_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }

    async fn sweep_revocations(&self, now_ms: i64) -> AuthResult<u64> {
        let deleted =
            sqlx::query("DELETE FROM wallet_auth_revoked_sessions WHERE expires_at_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(deleted)
    }
}

impl RateLimitStore for PgWalletAuthRepository {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError> {
        let window_start = config.window_start(now_ms);

        let (count,) = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO wallet_auth_rate_limits (client_key, window_start_ms, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (client_key, window_start_ms)
            DO UPDATE SET request_count = wallet_auth_rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(RateLimitResult::from_count(
            count.max(0) as u32,
            config,
            window_start,
        ))
    }

    async fn sweep(&self, config: &RateLimitConfig, now_ms: i64) -> Result<u64, RateLimitError> {
        let deleted = sqlx::query("DELETE FROM wallet_auth_rate_limits WHERE window_start_ms < $1")
            .bind(config.window_start(now_ms))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChallengeRow {
    nonce: String,
    bound_address: Option<String>,
    issued_at_ms: i64,
    expires_at_ms: i64,
}

impl ChallengeRow {
    fn into_challenge(self) -> AuthResult<Challenge> {
        let nonce = Nonce::parse(&self.nonce)
            .ok_or_else(|| AuthError::Internal(format!("stored nonce is invalid: {}", self.nonce)))?;
        let bound_address = self
            .bound_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("stored address is invalid: {e}")))?;

        Ok(Challenge {
            nonce,
            bound_address,
            issued_at_ms: self.issued_at_ms,
            expires_at_ms: self.expires_at_ms,
        })
    }
}
