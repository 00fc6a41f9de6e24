use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Stable machine-readable error codes surfaced in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "RIDE_NOT_FOUND")]
    RideNotFound,
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,
    #[serde(rename = "DRIVER_ALREADY_EXISTS")]
    DriverAlreadyExists,
    #[serde(rename = "CHECKOUT_IN_PROGRESS")]
    CheckoutInProgress,
    #[serde(rename = "PAYMENT_UNRECORDED")]
    PaymentUnrecorded,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,
    #[serde(rename = "PAYMENT_GATEWAY_ERROR")]
    PaymentGatewayError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::RideNotFound => "RIDE_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::DriverAlreadyExists => "DRIVER_ALREADY_EXISTS",
            ErrorCode::CheckoutInProgress => "CHECKOUT_IN_PROGRESS",
            ErrorCode::PaymentUnrecorded => "PAYMENT_UNRECORDED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::PaymentGatewayError => "PAYMENT_GATEWAY_ERROR",
            ErrorCode::ExternalServiceTimeout => "EXTERNAL_SERVICE_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Ride not found: {ride_id}")]
    RideNotFound { ride_id: String },

    #[error("User not found: {clerk_id}")]
    UserNotFound { clerk_id: String },

    #[error("Driver already registered: {email}")]
    DriverAlreadyExists { email: String },

    #[error("Checkout already in progress for user {user_id}")]
    CheckoutInProgress { user_id: String },

    #[error("Payment {payment_id} for order {order_id} verified but ride not recorded")]
    PaymentUnrecorded {
        order_id: String,
        payment_id: String,
    },
}

#[derive(Debug, Clone, Error)]
pub enum InfrastructureError {
    #[error("Database error: {message}")]
    Database { message: String, is_retryable: bool },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

#[derive(Debug, Clone, Error)]
pub enum ExternalError {
    #[error("Payment gateway error: {message}")]
    PaymentGateway { message: String, is_retryable: bool },

    #[error("{service} timed out after {timeout_secs}s")]
    Timeout { service: String, timeout_secs: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum AppErrorKind {
    #[error(transparent)]
    Domain(DomainError),
    #[error(transparent)]
    Infrastructure(InfrastructureError),
    #[error(transparent)]
    External(ExternalError),
    #[error(transparent)]
    Validation(ValidationError),
}

/// Unified application error carried through handlers. Every component
/// error converts into this before reaching the HTTP layer.
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(e) => match e {
                DomainError::RideNotFound { .. } => 404,
                DomainError::UserNotFound { .. } => 404,
                DomainError::DriverAlreadyExists { .. } => 409,
                DomainError::CheckoutInProgress { .. } => 409,
                DomainError::PaymentUnrecorded { .. } => 500,
            },
            AppErrorKind::Infrastructure(_) => 500,
            AppErrorKind::External(e) => match e {
                ExternalError::PaymentGateway { .. } => 500,
                ExternalError::Timeout { .. } => 504,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(e) => match e {
                DomainError::RideNotFound { .. } => ErrorCode::RideNotFound,
                DomainError::UserNotFound { .. } => ErrorCode::UserNotFound,
                DomainError::DriverAlreadyExists { .. } => ErrorCode::DriverAlreadyExists,
                DomainError::CheckoutInProgress { .. } => ErrorCode::CheckoutInProgress,
                DomainError::PaymentUnrecorded { .. } => ErrorCode::PaymentUnrecorded,
            },
            AppErrorKind::Infrastructure(e) => match e {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(e) => match e {
                ExternalError::PaymentGateway { .. } => ErrorCode::PaymentGatewayError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(e) => match e {
                DomainError::RideNotFound { .. } => "Ride not found".to_string(),
                DomainError::UserNotFound { .. } => "User not found".to_string(),
                DomainError::DriverAlreadyExists { .. } => {
                    "A driver with this email already exists".to_string()
                }
                DomainError::CheckoutInProgress { .. } => {
                    "A payment is already in progress for this user".to_string()
                }
                DomainError::PaymentUnrecorded { .. } => {
                    "Payment was captured but the ride could not be recorded. Please contact support"
                        .to_string()
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "An internal error occurred. Please try again".to_string()
            }
            AppErrorKind::External(e) => match e {
                ExternalError::PaymentGateway { .. } => {
                    "Payment gateway is unavailable. Please try again".to_string()
                }
                ExternalError::Timeout { .. } => {
                    "An upstream service timed out. Please try again".to_string()
                }
            },
            AppErrorKind::Validation(e) => e.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Infrastructure(e) => match e {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(e) => match e {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{} ({})", self.kind, ctx),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::new(AppErrorKind::Domain(e))
    }
}

impl From<InfrastructureError> for AppError {
    fn from(e: InfrastructureError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(e))
    }
}

impl From<ExternalError> for AppError {
    fn from(e: ExternalError) -> Self {
        AppError::new(AppErrorKind::External(e))
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::new(AppErrorKind::Validation(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_in_progress_is_conflict() {
        let err: AppError = DomainError::CheckoutInProgress {
            user_id: "user_1".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), ErrorCode::CheckoutInProgress);
        assert!(!err.is_retryable());
    }

    #[test]
    fn payment_unrecorded_is_distinct_from_generic_internal() {
        let err: AppError = DomainError::PaymentUnrecorded {
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), ErrorCode::PaymentUnrecorded);
        assert!(err.user_message().contains("contact support"));
    }

    #[test]
    fn missing_field_is_validation_error() {
        let err: AppError = ValidationError::MissingField {
            field: "razorpay_order_id".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), ErrorCode::ValidationError);
    }

    #[test]
    fn gateway_timeout_is_retryable() {
        let err: AppError = ExternalError::Timeout {
            service: "razorpay".to_string(),
            timeout_secs: 30,
        }
        .into();
        assert_eq!(err.status_code(), 504);
        assert!(err.is_retryable());
    }
}
