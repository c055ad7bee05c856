//! A request the client can send, and send again after a credential refresh.
//!
//! Everything needed to rebuild the outgoing request lives here so the
//! replay after a 401 is the same call with the new token.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// One part of a multipart upload.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone)]
pub struct PendingRequest {
    id: Uuid,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: RequestBody,
    retried: bool,
}

impl PendingRequest {
    /// `path` is relative to the API base URL, e.g. `api/players/`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Encodes `params` as the query string.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, ApiError> {
        let encoded = serde_urlencoded::to_string(params)
            .map_err(|e| ApiError::InvalidRequest(format!("query encoding failed: {e}")))?;
        self.query = (!encoded.is_empty()).then_some(encoded);
        Ok(self)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Adds a header. `Authorization` is always replaced by the client.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Marks the request as replayed. A replayed request is never refreshed
    /// for again.
    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_params_are_url_encoded() {
        let request = PendingRequest::get("api/lineups/")
            .query(&[("match", "12"), ("team", "3 & 4")])
            .unwrap();
        assert_eq!(request.query.as_deref(), Some("match=12&team=3+%26+4"));
        assert!(!request.is_retried());
    }

    #[test]
    fn cloned_requests_keep_identity_and_body() {
        let mut request = PendingRequest::post("api/financials/initiate-payment/")
            .json(&json!({"transaction_id": 5}))
            .unwrap();
        let copy = request.clone();
        request.mark_retried();

        assert_eq!(copy.id(), request.id());
        assert!(request.is_retried());
        assert!(!copy.is_retried());
        assert!(matches!(copy.body, RequestBody::Json(ref v) if v["transaction_id"] == 5));
    }
}
