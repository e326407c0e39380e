//! Mapping from domain errors to HTTP responses
//!
//! Every failure leaves the API as a shared [`ErrorResponse`] body. Refresh
//! failures collapse into one `invalid_session` response whatever the cause;
//! the session manager has already logged the specific reason.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use validator::ValidationErrors;

use cn_core::errors::{AuthError, DomainError};
use cn_shared::{error_codes, ErrorResponse};

const INVALID_SESSION_MESSAGE: &str = "Session is no longer valid, please log in again";

/// Convert a domain error to an HTTP response
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    let (status, body) = error_body(&error);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    } else {
        tracing::debug!(status = status.as_u16(), "Request rejected: {}", error);
    }
    HttpResponse::build(status).json(body)
}

fn error_body(error: &DomainError) -> (StatusCode, ErrorResponse) {
    if error.is_refresh_failure() {
        return (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::INVALID_SESSION, INVALID_SESSION_MESSAGE),
        );
    }

    match error {
        DomainError::Auth(AuthError::InvalidCredentials) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::INVALID_CREDENTIALS, "Invalid email or password"),
        ),
        DomainError::Auth(AuthError::Unauthenticated) => (StatusCode::UNAUTHORIZED, unauthenticated_body()),
        DomainError::Auth(AuthError::UserAlreadyExists) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::USER_EXISTS, AuthError::UserAlreadyExists.to_string()),
        ),
        DomainError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone()),
        ),
        DomainError::NotFound { resource } => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", capitalize(resource))),
        ),
        DomainError::Forbidden { message } => (
            StatusCode::FORBIDDEN,
            ErrorResponse::new(error_codes::FORBIDDEN, message.clone()),
        ),
        // Only GenerationFailed and storage faults reach here.
        DomainError::Auth(AuthError::InvalidSubject) | DomainError::Token(_) | DomainError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
        ),
    }
}

fn unauthenticated_body() -> ErrorResponse {
    ErrorResponse::new(error_codes::UNAUTHENTICATED, "Authentication required")
}

/// 400 body listing the fields that failed validation
pub fn handle_validation_errors(errors: ValidationErrors) -> HttpResponse {
    let mut response = ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request body");
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        response = response.add_detail(field, messages);
    }
    HttpResponse::BadRequest().json(response)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Domain error usable as an actix error, e.g. from middleware
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(error.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        error_body(&self.0).0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, body) = error_body(&self.0);
        HttpResponse::build(status).json(body)
    }
}
