//! Error conversions
//!
//! Database failures into [`AppError`], and the HTTP rendering of
//! [`AppError`] as an RFC 7807 problem document. Both are feature-gated.

#[cfg(any(feature = "sqlx", feature = "axum"))]
use super::app_error::AppError;
#[cfg(feature = "sqlx")]
use super::kind::ErrorKind;

/// Connectivity and capacity problems are 503; everything else is 500
#[cfg(feature = "sqlx")]
pub fn sqlx_error_kind(err: &sqlx::Error) -> ErrorKind {
    let unavailable = match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        // https://www.postgresql.org/docs/current/errcodes-appendix.html
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| code.starts_with("53") || code.starts_with("57")),
        _ => false,
    };
    if unavailable {
        ErrorKind::ServiceUnavailable
    } else {
        ErrorKind::InternalServerError
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    /// Driver messages stay in the source, never in the detail.
    fn from(err: sqlx::Error) -> Self {
        let app = match sqlx_error_kind(&err) {
            ErrorKind::ServiceUnavailable => {
                AppError::service_unavailable("Storage temporarily unavailable")
            }
            _ => AppError::internal("Internal server error"),
        };
        app.with_source(err)
    }
}

#[cfg(feature = "axum")]
mod response {
    use super::AppError;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde::Serialize;

    /// `application/problem+json` body with an extra `code` member
    #[derive(Serialize)]
    struct Problem<'a> {
        #[serde(rename = "type")]
        type_uri: String,
        title: &'static str,
        status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<&'a str>,
        detail: &'a str,
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let problem = Problem {
                type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
                title: self.kind().title(),
                status: status.as_u16(),
                code: self.code(),
                detail: self.message(),
            };
            (status, Json(problem)).into_response()
        }
    }
}
