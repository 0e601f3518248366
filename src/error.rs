use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Event capacity exceeded")]
    CapacityExceeded,

    #[error("Already enrolled")]
    AlreadyEnrolled,

    #[error("Verification code expired")]
    OtpExpired,

    #[error("Too many verification attempts")]
    OtpAttemptsExceeded,

    #[error("Verification code mismatch")]
    OtpMismatch,

    #[error("Email not verified")]
    EmailNotVerified,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden: {msg}");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    msg.clone(),
                )
            }
            AppError::DuplicateEmail => (
                actix_web::http::StatusCode::CONFLICT,
                "DUPLICATE_EMAIL",
                self.to_string(),
            ),
            AppError::CapacityExceeded => (
                actix_web::http::StatusCode::CONFLICT,
                "CAPACITY_EXCEEDED",
                self.to_string(),
            ),
            AppError::AlreadyEnrolled => (
                actix_web::http::StatusCode::CONFLICT,
                "ALREADY_ENROLLED",
                self.to_string(),
            ),
            AppError::OtpExpired => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "OTP_EXPIRED",
                self.to_string(),
            ),
            AppError::OtpAttemptsExceeded => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "OTP_ATTEMPTS_EXCEEDED",
                self.to_string(),
            ),
            AppError::OtpMismatch => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "OTP_MISMATCH",
                self.to_string(),
            ),
            AppError::EmailNotVerified => {
                log::warn!("Login attempt on unverified account");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "EMAIL_NOT_VERIFIED",
                    self.to_string(),
                )
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "Invalid token".to_string(),
                )
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_GATEWAY,
                    "EXTERNAL_API_ERROR",
                    msg.clone(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
