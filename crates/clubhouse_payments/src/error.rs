// --- File: crates/clubhouse_payments/src/error.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clubhouse_common::{external_service_error, ClubhouseError, HttpStatusCode, StorageError};
use serde_json::json;
use thiserror::Error;

pub const MISSING_REDIRECT_MESSAGE: &str = "Payment initiated but no URL found.";
pub const INITIATION_FAILED_MESSAGE: &str = "Payment initiation failed. Please try again.";
pub const INVALID_TRANSACTION_MESSAGE: &str = "Invalid transaction ID.";
pub const VERIFICATION_FAILED_MESSAGE: &str =
    "Could not verify payment status. Please contact support.";

/// Payment flow errors. The `Display` text of each variant is the message
/// shown to the member.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The backend accepted the request but returned no gateway URL
    #[error("{message}")]
    MissingRedirect { message: String },

    /// The initiate call itself failed
    #[error("{message}")]
    InitiationFailed {
        message: String,
        status: u16,
        cause: String,
    },

    /// No correlation id is stored, so there is nothing to verify
    #[error("Invalid transaction ID.")]
    MissingCorrelationId,

    /// The status endpoint could not be reached or answered with an error
    #[error("{message}")]
    VerificationFailed {
        message: String,
        status: u16,
        cause: String,
    },

    /// Session storage for the correlation id failed
    #[error("payment session storage failed: {0}")]
    Storage(#[from] StorageError),

    /// Payments are switched off in the configuration
    #[error("Payments are disabled.")]
    Disabled,
}

impl PaymentError {
    /// True when the backend call failed because the session expired.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            PaymentError::InitiationFailed { status: 401, .. }
                | PaymentError::VerificationFailed { status: 401, .. }
        )
    }
}

impl From<PaymentError> for ClubhouseError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::MissingRedirect { .. } => external_service_error("payment gateway", message),
            PaymentError::InitiationFailed { status, cause, .. }
            | PaymentError::VerificationFailed { status, cause, .. } => match status {
                401 => ClubhouseError::AuthError(cause),
                404 => ClubhouseError::NotFoundError(message),
                400..=499 => ClubhouseError::ValidationError(message),
                504 => ClubhouseError::TimeoutError(message),
                _ => external_service_error("club API", message),
            },
            PaymentError::MissingCorrelationId => ClubhouseError::ValidationError(message),
            PaymentError::Storage(e) => ClubhouseError::StorageError(e.to_string()),
            PaymentError::Disabled => ClubhouseError::ConfigError(message),
        }
    }
}

impl HttpStatusCode for PaymentError {
    fn status_code(&self) -> u16 {
        match self {
            PaymentError::MissingRedirect { .. } => 502,
            PaymentError::InitiationFailed { status, .. }
            | PaymentError::VerificationFailed { status, .. } => {
                if (400..600).contains(status) {
                    *status
                } else {
                    502
                }
            }
            PaymentError::MissingCorrelationId => 400,
            PaymentError::Storage(_) => 500,
            PaymentError::Disabled => 503,
        }
    }
}

/// Renders the member-facing message as is, without the taxonomy prefix
/// `ClubhouseError` adds.
impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status.as_u16(),
                "requires_login": self.requires_login(),
            }
        }));
        (status, body).into_response()
    }
}
