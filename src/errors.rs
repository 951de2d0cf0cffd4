// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Flagship not found")]
    FlagshipNotFound,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Refund not found")]
    RefundNotFound,

    #[error("Payment already {0}")]
    PaymentAlreadyProcessed(String),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No screenshot provided")]
    MissingScreenshot,

    #[error("Screenshot too large")]
    ScreenshotTooLarge,

    #[error("Invalid screenshot format")]
    InvalidScreenshotFormat,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, "Invalid multipart data".to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::FlagshipNotFound => (StatusCode::NOT_FOUND, "Flagship not found".to_string()),
            AppError::RegistrationNotFound => (StatusCode::NOT_FOUND, "Registration not found".to_string()),
            AppError::PaymentNotFound => (StatusCode::NOT_FOUND, "Payment not found".to_string()),
            AppError::RefundNotFound => (StatusCode::NOT_FOUND, "Refund not found".to_string()),
            AppError::PaymentAlreadyProcessed(_) => (StatusCode::CONFLICT, "Payment already processed".to_string()),
            AppError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, "Invalid ID format".to_string()),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::MissingScreenshot => (StatusCode::BAD_REQUEST, "No screenshot provided".to_string()),
            AppError::ScreenshotTooLarge => (StatusCode::BAD_REQUEST, "Screenshot too large".to_string()),
            AppError::InvalidScreenshotFormat => (StatusCode::BAD_REQUEST, "Invalid screenshot format".to_string()),
            AppError::StorageError(_) => (StatusCode::BAD_GATEWAY, "Storage error".to_string()),
            AppError::MailError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Mail error".to_string()),
            AppError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string()),
            AppError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Manual From implementations
impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(err: std::num::ParseFloatError) -> Self {
        AppError::ValidationError(format!("Number parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::StorageError(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::MailError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(AppError::UserNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::FlagshipNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RegistrationNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PaymentNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RefundNotFound.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_already_processed_maps_to_409() {
        let err = AppError::PaymentAlreadyProcessed("approved".to_string());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_input_maps_to_400() {
        assert_eq!(
            AppError::ValidationError("amount".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidObjectId("xyz".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingScreenshot.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_collaborator_failures() {
        assert_eq!(
            AppError::StorageError("upload".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::ServiceUnavailable("storage".into()).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
