use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range input (bad payment mode, non-positive
    /// amount, collection exceeding total due)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced customer or collection entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller's role or customer assignment does not permit the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Receipt number collision, or a state transition that is no longer
    /// valid (e.g. voiding an already-voided entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying persistence failure; opaque to callers
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant breaches and unexpected states
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Storage failures must stay opaque; every other variant carries a
        // caller-correctable message.
        let error_message = match self {
            AppError::Database(db_err) => {
                tracing::error!("Database error: {}", db_err);
                "A storage error occurred".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
