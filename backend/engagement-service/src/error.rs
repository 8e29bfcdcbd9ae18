/// Error types for engagement-service
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced to callers of the produced API.
///
/// Store errors never leak: each component translates them into one of
/// these kinds at its boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// A mutation was rejected by an underlying store
    pub fn write_failed(context: &str, err: impl std::fmt::Display) -> Self {
        ServiceError::WriteFailed(format!("{}: {}", context, err))
    }

    /// A read against an underlying store failed or timed out
    pub fn unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        ServiceError::Unavailable(format!("{}: {}", context, err))
    }

    /// Short machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::WriteFailed(_) => "write_failed",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Unavailable(_) => "unavailable",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    pub code: u16,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        HttpResponse::build(code).json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
            code: code.as_u16(),
        })
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::NotFound("post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized("login".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::write_failed("insert post", "rejected").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_is_kept_in_message() {
        let err = ServiceError::unavailable("read timeline", "timed out");
        assert_eq!(err.to_string(), "Store unavailable: read timeline: timed out");
        assert_eq!(err.kind(), "unavailable");
    }
}
