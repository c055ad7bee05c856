use clubhouse_common::{
    external_service_error, ClubhouseError, HttpStatusCode, ServerPayload, StorageError,
};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Why a credential refresh did not produce a new access token.
///
/// Cloneable because every request waiting on the same refresh receives it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("refresh request failed: {0}")]
    Transport(String),
    #[error("refresh rejected with status {0}")]
    Rejected(u16),
    #[error("refresh response carried no access token")]
    MissingAccessToken,
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error("credential storage failed: {0}")]
    Storage(String),
}

/// How a 401 ended up reaching the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// No refresh token was stored, so no refresh was attempted.
    NoRefreshToken,
    /// The refresh itself failed.
    RefreshFailed(RefreshFailure),
    /// The request had already been replayed once with fresh credentials.
    RejectedAfterRefresh,
    /// The refresh endpoint answered 401.
    RefreshEndpoint,
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnauthorizedReason::NoRefreshToken => write!(f, "no refresh token stored"),
            UnauthorizedReason::RefreshFailed(failure) => write!(f, "{}", failure),
            UnauthorizedReason::RejectedAfterRefresh => {
                write!(f, "rejected again after credential refresh")
            }
            UnauthorizedReason::RefreshEndpoint => write!(f, "refresh endpoint rejected"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was received.
    #[error("club API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status other than a
    /// recoverable 401.
    #[error("club API returned {status}")]
    Status {
        status: StatusCode,
        payload: Option<Value>,
    },

    /// A 401 that survived the refresh attempt. The session needs a new login.
    #[error("not authenticated: {reason}")]
    Unauthorized {
        payload: Option<Value>,
        reason: UnauthorizedReason,
    },

    #[error("failed to decode club API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// True when the only way forward is to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// The HTTP status the server answered with, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl ServerPayload for ApiError {
    fn server_payload(&self) -> Option<&Value> {
        match self {
            ApiError::Status { payload, .. } | ApiError::Unauthorized { payload, .. } => {
                payload.as_ref()
            }
            _ => None,
        }
    }
}

impl From<ApiError> for ClubhouseError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Transport(e) if e.is_timeout() => ClubhouseError::TimeoutError(err.to_string()),
            ApiError::Transport(_) => ClubhouseError::HttpError(err.to_string()),
            ApiError::Unauthorized { .. } => ClubhouseError::AuthError(err.to_string()),
            ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                ClubhouseError::NotFoundError(err.user_message("resource not found"))
            }
            ApiError::Status { status, .. } if status.is_client_error() => {
                ClubhouseError::ValidationError(err.user_message("request rejected"))
            }
            ApiError::Status { .. } => {
                external_service_error("club API", err.user_message("server error"))
            }
            ApiError::Decode(_) => ClubhouseError::ParseError(err.to_string()),
            ApiError::InvalidRequest(_) => ClubhouseError::InternalError(err.to_string()),
            ApiError::Storage(_) => ClubhouseError::StorageError(err.to_string()),
        }
    }
}

impl HttpStatusCode for ApiError {
    fn status_code(&self) -> u16 {
        match self {
            ApiError::Transport(_) => 502,
            ApiError::Status { status, .. } => status.as_u16(),
            ApiError::Unauthorized { .. } => 401,
            ApiError::Decode(_) => 502,
            ApiError::InvalidRequest(_) => 500,
            ApiError::Storage(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_errors_carry_server_message() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            payload: Some(json!({"message": "Transaction already paid"})),
        };
        assert_eq!(err.user_message("fallback"), "Transaction already paid");
        assert!(!err.requires_login());
        match ClubhouseError::from(err) {
            ClubhouseError::ValidationError(msg) => assert_eq!(msg, "Transaction already paid"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_requires_login() {
        let err = ApiError::Unauthorized {
            payload: None,
            reason: UnauthorizedReason::RefreshFailed(RefreshFailure::MissingAccessToken),
        };
        assert!(err.requires_login());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(matches!(
            ClubhouseError::from(err),
            ClubhouseError::AuthError(_)
        ));
    }
}
