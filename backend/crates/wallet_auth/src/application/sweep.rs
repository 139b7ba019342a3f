//! Sweep Expired Use Case

use crate::application::config::WalletAuthConfig;
use crate::domain::repository::WalletAuthRepository;
use crate::error::{AuthError, AuthResult};
use platform::time::Clock;
use std::sync::Arc;

/// Rows removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub challenges: u64,
    pub revocations: u64,
    pub rate_limit_windows: u64,
}

/// Removes expired challenges, revocations and stale rate-limit windows
pub struct SweepExpiredUseCase<R>
where
    R: WalletAuthRepository,
{
    repo: Arc<R>,
    config: Arc<WalletAuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> SweepExpiredUseCase<R>
where
    R: WalletAuthRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<WalletAuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, config, clock }
    }

    pub async fn execute(&self) -> AuthResult<SweepReport> {
        let now_ms = self.clock.now_ms();

        let report = SweepReport {
            challenges: self.repo.sweep_challenges(now_ms).await?,
            revocations: self.repo.sweep_revocations(now_ms).await?,
            rate_limit_windows: self
                .repo
                .sweep(&self.config.rate_limit, now_ms)
                .await
                .map_err(|e| AuthError::Internal(format!("rate limit store: {e}")))?,
        };

        tracing::debug!(
            challenges = report.challenges,
            revocations = report.revocations,
            rate_limit_windows = report.rate_limit_windows,
            "Swept expired wallet auth data"
        );

        Ok(report)
    }
}
