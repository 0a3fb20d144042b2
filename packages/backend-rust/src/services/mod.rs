pub mod completions;
pub mod journeys;
pub mod learning_style;
pub mod options;
pub mod questions;
pub mod sessions;
pub mod tutorials;

use thiserror::Error;

use crate::db::StorageError;
use crate::response::AppError;

use self::learning_style::PipelineError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => AppError::validation(message),
            ServiceError::BadRequest(message) => AppError::bad_request(message),
            ServiceError::NotFound(message) => AppError::not_found(message),
            ServiceError::Storage(err) => AppError::internal(err.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidPeriod(err) => AppError::validation(err.to_string()),
            other => AppError::internal(other.to_string()),
        }
    }
}

/// Parses a positive numeric path id.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ServiceError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServiceError::Validation(format!("Invalid {what} id")))
}

pub(crate) fn required_text(value: Option<&str>, field: &str) -> Result<String, ServiceError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Validation(format!("{field} is required")))
}

pub(crate) fn non_negative(value: i32, field: &str) -> Result<i32, ServiceError> {
    if value < 0 {
        return Err(ServiceError::Validation(format!("{field} must not be negative")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(parse_id("12", "journey").unwrap(), 12);
        assert!(parse_id("0", "journey").is_err());
        assert!(parse_id("-4", "journey").is_err());
        assert!(parse_id("abc", "journey").is_err());
    }

    #[test]
    fn maps_to_http_errors() {
        let err: AppError = ServiceError::NotFound("Tutorial not found".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = ServiceError::Validation("title is required".into()).into();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err: AppError = ServiceError::Storage(StorageError::Unavailable("down".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
