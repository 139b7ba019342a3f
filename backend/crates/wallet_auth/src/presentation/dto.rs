//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Query for GET /auth/challenge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeQuery {
    #[serde(default)]
    pub address: Option<String>,
}

/// Response for GET /auth/challenge
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub issued_at: String,
    pub expires_at: String,
}

/// Request for POST /auth/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
}

/// Response for POST /auth/verify
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub token: String,
    pub address: String,
    pub expires_at: String,
}

/// Response for GET /auth/session
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Unix milliseconds as ISO 8601 (`2024-01-01T00:00:00.000Z`)
pub fn iso8601(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
