use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The base error type shared by all Clubhouse crates.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>`
/// for `ClubhouseError`, so handlers can render any failure the same way.
#[derive(Error, Debug)]
pub enum ClubhouseError {
    /// The request never produced a response (DNS, TLS, connection reset, ...)
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The session has no usable credentials; the user must log in again
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// The club API rejected the input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred while reading or writing client-side storage
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ClubhouseError {
    fn status_code(&self) -> u16 {
        match self {
            ClubhouseError::HttpError(_) => 502,
            ClubhouseError::ParseError(_) => 502,
            ClubhouseError::ConfigError(_) => 500,
            ClubhouseError::AuthError(_) => 401,
            ClubhouseError::ValidationError(_) => 400,
            ClubhouseError::StorageError(_) => 500,
            ClubhouseError::ExternalServiceError { .. } => 502,
            ClubhouseError::NotFoundError(_) => 404,
            ClubhouseError::TimeoutError(_) => 504,
            ClubhouseError::InternalError(_) => 500,
        }
    }
}

/// Errors that may carry the JSON body the club API answered with.
///
/// The body is what user-facing messages are derived from.
pub trait ServerPayload {
    /// The decoded error body, if the server sent one.
    fn server_payload(&self) -> Option<&Value>;

    /// A message fit for display, derived from the payload or `fallback`.
    fn user_message(&self, fallback: &str) -> String {
        message_from_payload(self.server_payload(), fallback)
    }
}

/// Picks a human readable message out of an API error body.
///
/// A bare string wins, then a `message` field, then an `error` field, then
/// the compact JSON text of the whole body. Empty bodies yield `fallback`.
pub fn message_from_payload(payload: Option<&Value>, fallback: &str) -> String {
    match payload {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(value) => {
            if let Some(message) = value.get("message").and_then(scalar_text) {
                return message;
            }
            if let Some(error) = value.get("error").and_then(scalar_text) {
                return error;
            }
            serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> ClubhouseError {
    ClubhouseError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_prefers_plain_string_body() {
        let body = json!("Transaction already paid");
        assert_eq!(
            message_from_payload(Some(&body), "fallback"),
            "Transaction already paid"
        );
    }

    #[test]
    fn message_then_error_field_then_json_text() {
        let body = json!({"message": "Amount mismatch", "error": "ignored"});
        assert_eq!(message_from_payload(Some(&body), "fallback"), "Amount mismatch");

        let body = json!({"error": "Gateway unavailable"});
        assert_eq!(
            message_from_payload(Some(&body), "fallback"),
            "Gateway unavailable"
        );

        let body = json!({"transaction_id": ["This field is required."]});
        assert_eq!(
            message_from_payload(Some(&body), "fallback"),
            r#"{"transaction_id":["This field is required."]}"#
        );
    }

    #[test]
    fn missing_payload_uses_fallback() {
        assert_eq!(message_from_payload(None, "Try again."), "Try again.");
        assert_eq!(
            message_from_payload(Some(&Value::Null), "Try again."),
            "Try again."
        );
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ClubhouseError::AuthError("x".into()).status_code(), 401);
        assert_eq!(ClubhouseError::ValidationError("x".into()).status_code(), 400);
        assert_eq!(external_service_error("club api", "down").status_code(), 502);
    }
}
