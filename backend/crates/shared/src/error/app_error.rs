//! Application Error
//!
//! [`AppError`] is what leaves a service boundary. Domain crates keep their
//! own error enums and convert into it when rendering a response.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// Boundary error: an HTTP class, a client-safe detail, and optionally a
/// stable machine code and the underlying cause
///
/// The cause is for logs only and is never rendered.
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Unauthorized, "Session expired")
///     .with_code("SESSION_EXPIRED");
/// assert_eq!(err.status_code(), 401);
/// assert_eq!(err.code(), Some("SESSION_EXPIRED"));
/// ```
pub struct AppError {
    kind: ErrorKind,
    code: Option<&'static str>,
    detail: Cow<'static, str>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl AppError {
    pub fn new(kind: ErrorKind, detail: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            code: None,
            detail: detail.into(),
            source: None,
        }
    }

    pub fn internal(detail: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, detail)
    }

    pub fn service_unavailable(detail: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, detail)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn code(&self) -> Option<&str> {
        self.code
    }

    /// Client-safe detail text
    pub fn message(&self) -> &str {
        &self.detail
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("detail", &self.detail)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = self.code {
            write!(f, " ({code})")?;
        }
        write!(f, ": {}", self.detail)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::Unauthorized, "Signature invalid");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Signature invalid");
        assert!(err.code().is_none());
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::new(ErrorKind::BadRequest, "Bad address");
        assert_eq!(err.to_string(), "Bad Request: Bad address");

        let err = err.with_code("INVALID_FIELD");
        assert_eq!(err.to_string(), "Bad Request (INVALID_FIELD): Bad address");
    }

    #[test]
    fn test_source_kept_for_logs() {
        let cause = std::io::Error::other("socket closed");
        let err = AppError::service_unavailable("Store unavailable").with_source(cause);
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.source().unwrap().to_string(), "socket closed");
        assert!(!err.to_string().contains("socket closed"));
    }
}
