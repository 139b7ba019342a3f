//! Server settings from the environment

use anyhow::{Context, bail};
use std::net::SocketAddr;
use std::time::Duration;
use wallet_auth::{SessionSecret, WalletAuthConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Process-level settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// PostgreSQL URL; in-memory storage when absent
    pub database_url: Option<String>,
}

impl ServerSettings {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:31113")?;

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            frontend_origins,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
        })
    }
}

/// Build the wallet auth configuration, overriding defaults from `lookup`
///
/// Without `WALLET_AUTH_SESSION_SECRET` a random secret is generated when
/// `allow_random_secret` is set (debug builds); otherwise it is an error.
pub fn wallet_auth_config(
    lookup: impl Fn(&str) -> Option<String>,
    allow_random_secret: bool,
) -> anyhow::Result<WalletAuthConfig> {
    let mut config = if allow_random_secret {
        WalletAuthConfig::development()
    } else {
        WalletAuthConfig::default()
    };

    if let Some(domain) = lookup("WALLET_AUTH_DOMAIN") {
        config.domain = domain;
    }
    if let Some(uri) = lookup("WALLET_AUTH_URI") {
        config.uri = uri;
    }
    if let Some(statement) = lookup("WALLET_AUTH_STATEMENT") {
        config.statement = statement;
    }
    if let Some(chain_id) = lookup("WALLET_AUTH_CHAIN_ID") {
        config.chain_id = chain_id
            .trim()
            .parse()
            .context("WALLET_AUTH_CHAIN_ID must be a positive integer")?;
    }
    if let Some(secs) = lookup("WALLET_AUTH_CHALLENGE_TTL_SECS") {
        config.challenge_ttl = parse_secs(&secs).context("WALLET_AUTH_CHALLENGE_TTL_SECS")?;
    }
    if let Some(secs) = lookup("WALLET_AUTH_SESSION_TTL_SECS") {
        config.session_ttl = parse_secs(&secs).context("WALLET_AUTH_SESSION_TTL_SECS")?;
    }
    if let Some(hops) = lookup("WALLET_AUTH_TRUSTED_PROXY_HOPS") {
        config.trusted_proxy_hops = hops
            .trim()
            .parse()
            .context("WALLET_AUTH_TRUSTED_PROXY_HOPS must be a whole number")?;
    }

    match lookup("WALLET_AUTH_SESSION_SECRET") {
        Some(secret) => {
            config.session_secret = SessionSecret::from_base64(&secret)
                .context("WALLET_AUTH_SESSION_SECRET must be 32 bytes of standard base64")?;
        }
        None if allow_random_secret => {
            tracing::warn!("WALLET_AUTH_SESSION_SECRET not set, using a random secret");
        }
        None => bail!("WALLET_AUTH_SESSION_SECRET must be set in production"),
    }

    config
        .validate()
        .context("invalid wallet auth configuration")?;
    Ok(config)
}

fn parse_secs(value: &str) -> anyhow::Result<Duration> {
    let secs: u64 = value.trim().parse().context("expected whole seconds")?;
    Ok(Duration::from_secs(secs))
}
