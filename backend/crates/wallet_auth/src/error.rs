//! Wallet Auth Error Types
//!
//! Domain error variants for the sign-in flow. Each variant carries an HTTP
//! status, a kernel [`ErrorKind`] and a stable machine code, and renders
//! through [`AppError`] as an RFC 7807 problem body.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::conversions::sqlx_error_kind;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Wallet auth result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Wallet auth error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Nonce absent, already consumed, or expired
    #[error("Challenge not found, already used, or expired")]
    ChallengeInvalid,

    /// Signed message differs from the one that was issued
    #[error("Signed message does not match the issued challenge")]
    MessageMismatch,

    /// Message is not in canonical sign-in format
    #[error("Message is not a canonical sign-in message")]
    MalformedMessage,

    /// A required field is empty or not well formed
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Signature fails structural checks (length, encoding, recovery id)
    #[error("Malformed signature")]
    MalformedSignature,

    /// Recovery failed or the recovered address differs from the claimed one
    #[error("Signature does not match the claimed address")]
    SignatureInvalid,

    #[error("Session expired")]
    SessionExpired,

    /// Token integrity failure or revoked session
    #[error("Session invalid")]
    SessionInvalid,

    /// No bearer credential on a protected call
    #[error("Missing bearer credentials")]
    MissingCredentials,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status, derived from [`Self::kind`]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MalformedMessage
            | AuthError::InvalidField(_)
            | AuthError::MalformedSignature => ErrorKind::BadRequest,
            AuthError::ChallengeInvalid
            | AuthError::MessageMismatch
            | AuthError::SignatureInvalid
            | AuthError::SessionExpired
            | AuthError::SessionInvalid
            | AuthError::MissingCredentials => ErrorKind::Unauthorized,
            AuthError::RateLimitExceeded => ErrorKind::TooManyRequests,
            AuthError::Database(e) => sqlx_error_kind(e),
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::ChallengeInvalid => "CHALLENGE_INVALID",
            AuthError::MessageMismatch => "MESSAGE_MISMATCH",
            AuthError::MalformedMessage => "MALFORMED_MESSAGE",
            AuthError::InvalidField(_) => "INVALID_FIELD",
            AuthError::MalformedSignature => "MALFORMED_SIGNATURE",
            AuthError::SignatureInvalid => "SIGNATURE_INVALID",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::SessionInvalid => "SESSION_INVALID",
            AuthError::MissingCredentials => "MISSING_CREDENTIALS",
            AuthError::RateLimitExceeded => "RATE_LIMITED",
            AuthError::Database(_) => "DATABASE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Wallet auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Wallet auth internal error");
            }
            AuthError::MessageMismatch | AuthError::SignatureInvalid => {
                tracing::warn!(code = self.code(), "Rejected sign-in proof");
            }
            AuthError::RateLimitExceeded => {
                tracing::warn!("Challenge rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Wallet auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        // Server-side failures are logged, not echoed
        match err {
            AuthError::Database(e) => AppError::from(e).with_code(code),
            AuthError::Internal(_) => AppError::internal("Internal server error").with_code(code),
            other => AppError::new(other.kind(), other.to_string()).with_code(code),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let unauthorized = self.status_code() == StatusCode::UNAUTHORIZED;
        let mut response = AppError::from(self).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
