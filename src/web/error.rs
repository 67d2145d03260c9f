//! Error types and helpers for mapping errors to HTTP responses.
//!
//! The [`ApiError`] type carries both an HTTP status code and a message.
//! Use [`ResultExt`] to attach status codes to `anyhow::Error` chains, or
//! [`status_bail!`](crate::status_bail) for early returns.

use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};
use warp::http::StatusCode;
use warp::reject::Reject;

/// Message returned for every failure which must not leak its cause.
pub const MESSAGE_INTERNAL_ERROR: &str = "Internal server error";

/// An error that can be serialized to JSON and returned as an HTTP response.
///
/// Serializes as `{"detail": "...", "errors": [...]}`, where `errors` is only
/// present for validation failures. The `status` field determines the HTTP
/// status code but is not serialized.
#[derive(Clone, Serialize, Debug)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub detail: String,
    /// Individual validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)?;
        if !self.errors.is_empty() {
            write!(f, ": {}", self.errors.join("; "))?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl Reject for ApiError {}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl ToString) -> Self {
        ApiError {
            status,
            detail: detail.to_string(),
            errors: Vec::new(),
        }
    }

    /// Creates a 422 error listing each violated field rule.
    pub fn unprocessable(detail: impl ToString, errors: Vec<String>) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.to_string(),
            errors,
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MESSAGE_INTERNAL_ERROR)
    }
}

/// Extension trait for attaching HTTP status codes to error results.
pub trait ResultExt<T> {
    /// Wraps the error with an [`ApiError`] carrying the given status code.
    fn with_status(self, status: StatusCode) -> Result<T, anyhow::Error>;
}

impl<T> ResultExt<T> for Result<T, anyhow::Error> {
    fn with_status(self, status: StatusCode) -> Result<T, anyhow::Error> {
        match self {
            Ok(t) => Ok(t),
            Err(err) => {
                let detail = format!("{:#}", err);
                Err(err.context(ApiError::new(status, detail)))
            }
        }
    }
}

/// Early return with a custom HTTP status code.
#[macro_export]
macro_rules! status_bail {
    ($status:expr, $msg:literal $(,)?) => {
        return $crate::web::error::ResultExt::with_status(Err(::anyhow::anyhow!($msg)), $status)
    };
    ($status:expr, $fmt:literal, $($arg:tt)*) => {
        return $crate::web::error::ResultExt::with_status(Err(::anyhow::anyhow!($fmt, $($arg)*)), $status)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fails_with_status() -> anyhow::Result<()> {
        status_bail!(StatusCode::CONFLICT, "Sensor {} already exists", "a");
    }

    #[test]
    fn serializes_detail_only_without_errors() {
        let err = ApiError::new(StatusCode::NOT_FOUND, "Sensor not found");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"detail": "Sensor not found"})
        );
    }

    #[test]
    fn serializes_validation_errors() {
        let err = ApiError::unprocessable("Validation failed", vec!["unit is required".into()]);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"detail": "Validation failed", "errors": ["unit is required"]})
        );
    }

    #[test]
    fn status_bail_attaches_status() {
        let err = fails_with_status().unwrap_err();
        let api_error = err.downcast_ref::<ApiError>().unwrap();

        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.detail, "Sensor a already exists");
    }
}
