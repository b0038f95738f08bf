//! Unified error handling with Sentry integration.
//!
//! Every JSON handler returns `Result<ApiResponse<T>, AppError>`. Both sides
//! serialize to the same envelope:
//!
//! ```json
//! { "success": false, "message": "Access denied" }
//! ```
//!
//! Server-side failures are captured to Sentry before responding; their
//! details never reach the client.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::booking::BookingError;
use crate::services::notifications::NotifyError;
use crate::services::order_admin::OrderAdminError;
use crate::services::payments::PaymentError;
use crate::services::receipt::ReceiptError;

/// Message for every authorization failure.
pub const ACCESS_DENIED: &str = "Access denied";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Booking was rejected or failed.
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Customer notification failed.
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Receipt lookup failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Admin order action failed.
    #[error("Order error: {0}")]
    OrderAdmin(#[from] OrderAdminError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The uniform authorization failure.
    #[must_use]
    pub fn access_denied() -> Self {
        Self::Forbidden(ACCESS_DENIED.to_string())
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Payment(_) | Self::Notify(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Booking(err) => matches!(err, BookingError::Repository(_)),
            Self::Receipt(err) => matches!(err, ReceiptError::Repository(_)),
            Self::OrderAdmin(err) => {
                matches!(err, OrderAdminError::Repository(_) | OrderAdminError::Notify(_))
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Notify(_) => StatusCode::BAD_GATEWAY,
            Self::Payment(err) => match err {
                PaymentError::NotPayable(_) => StatusCode::CONFLICT,
                PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccessDenied => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::MissingName => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Booking(err) => match err {
                BookingError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                BookingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Receipt(err) => match err {
                ReceiptError::NotFound => StatusCode::NOT_FOUND,
                ReceiptError::AccessDenied => StatusCode::FORBIDDEN,
                ReceiptError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OrderAdmin(err) => match err {
                OrderAdminError::NotFound => StatusCode::NOT_FOUND,
                OrderAdminError::AccessDenied => StatusCode::FORBIDDEN,
                OrderAdminError::InvalidTransition { .. } | OrderAdminError::AlreadyPaid => {
                    StatusCode::CONFLICT
                }
                OrderAdminError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                OrderAdminError::Notify(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    // Don't expose internal error details to clients
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Notify(_) => "Could not send the WhatsApp message".to_string(),
            Self::Payment(err) => match err {
                PaymentError::NotPayable(_) => "This order cannot be paid for".to_string(),
                PaymentError::Repository(_) => "Internal server error".to_string(),
                _ => "Payment service error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::AccessDenied => ACCESS_DENIED.to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidPhone(e) => format!("Invalid phone number: {e}"),
                AuthError::MissingName => "Name is required".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Booking(err) => match err {
                BookingError::Repository(RepositoryError::Conflict(msg)) => msg.clone(),
                BookingError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Receipt(err) => match err {
                ReceiptError::NotFound => "Order not found".to_string(),
                ReceiptError::AccessDenied => ACCESS_DENIED.to_string(),
                ReceiptError::Repository(_) => "Internal server error".to_string(),
            },
            Self::OrderAdmin(err) => match err {
                OrderAdminError::AccessDenied => ACCESS_DENIED.to_string(),
                OrderAdminError::Repository(_) => "Internal server error".to_string(),
                OrderAdminError::Notify(_) => "Could not send the WhatsApp message".to_string(),
                other => other.to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ApiResponse::<()>::failure(self.client_message());
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor that rejects malformed bodies with the envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// The uniform JSON envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with no data.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// A failed response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order o1".to_string());
        assert_eq!(err.to_string(), "Not found: order o1");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status_of(AppError::access_denied()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::Unauthorized("login".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Receipt(ReceiptError::AccessDenied)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::AccessDenied)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Booking(BookingError::NoItems)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_denials_share_one_message() {
        assert_eq!(AppError::access_denied().client_message(), ACCESS_DENIED);
        assert_eq!(
            AppError::Receipt(ReceiptError::AccessDenied).client_message(),
            ACCESS_DENIED
        );
        assert_eq!(
            AppError::Auth(AuthError::AccessDenied).client_message(),
            ACCESS_DENIED
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
