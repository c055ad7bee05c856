// --- File: crates/clubhouse_payments/src/logic.rs ---

use clubhouse_common::models::PaymentStatusResponse;
use clubhouse_common::services::PaymentBackend;
use clubhouse_common::{HttpStatusCode, ServerPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::error::{
    PaymentError, INITIATION_FAILED_MESSAGE, MISSING_REDIRECT_MESSAGE, VERIFICATION_FAILED_MESSAGE,
};
use crate::store::CorrelationStore;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const SUCCESS_MESSAGE: &str = "Your payment was successful!";
pub const PENDING_MESSAGE: &str = "Payment is currently pending. Please check back later.";
pub const DECLINED_MESSAGE: &str = "Payment failed or declined.";

/// Request body accepted by the initiate route.
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InitiatePaymentRequest {
    #[cfg_attr(feature = "openapi", schema(example = 42))]
    pub transaction_id: i64,
}

/// Where to send the member to pay. Navigation is up to the caller.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ExternalRedirect {
    #[cfg_attr(feature = "openapi", schema(example = "https://pay.example/x"))]
    pub url: String,
    pub merchant_transaction_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Pending,
    Failure,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PaymentVerification {
    pub outcome: PaymentOutcome,
    pub message: String,
}

impl PaymentVerification {
    fn new(outcome: PaymentOutcome, message: &str) -> Self {
        Self {
            outcome,
            message: message.to_string(),
        }
    }
}

/// Initiation and verification against a payment backend, with the
/// correlation id kept in session storage in between.
pub struct PaymentFlow<B: PaymentBackend> {
    backend: B,
    correlation: CorrelationStore,
}

impl<B: PaymentBackend> PaymentFlow<B> {
    pub fn new(backend: B, correlation: CorrelationStore) -> Self {
        Self {
            backend,
            correlation,
        }
    }

    pub fn correlation(&self) -> &CorrelationStore {
        &self.correlation
    }

    /// Starts a gateway session for `transaction_id`.
    ///
    /// The correlation id is stored before the redirect is handed back, so
    /// it is readable by [`verify`](Self::verify) whatever the caller does next.
    #[instrument(skip(self))]
    pub async fn initiate(&self, transaction_id: i64) -> Result<ExternalRedirect, PaymentError> {
        let initiation = self
            .backend
            .initiate_payment(transaction_id)
            .await
            .map_err(|e| {
                error!("payment initiation failed: {}", e);
                PaymentError::InitiationFailed {
                    message: e.user_message(INITIATION_FAILED_MESSAGE),
                    status: e.status_code(),
                    cause: e.to_string(),
                }
            })?;

        let Some(url) = initiation.payment_url.filter(|u| !u.trim().is_empty()) else {
            warn!("payment initiated without a gateway URL");
            let explanation = initiation
                .message
                .or(initiation.error)
                .filter(|m| !m.trim().is_empty());
            return Err(PaymentError::MissingRedirect {
                message: explanation.unwrap_or_else(|| MISSING_REDIRECT_MESSAGE.to_string()),
            });
        };

        let merchant_transaction_id = initiation
            .merchant_transaction_id
            .filter(|id| !id.trim().is_empty());
        match &merchant_transaction_id {
            Some(id) => self.correlation.remember(id)?,
            None => warn!("gateway session has no merchant transaction id to verify later"),
        }

        info!("redirecting transaction {} to the payment gateway", transaction_id);
        Ok(ExternalRedirect {
            url,
            merchant_transaction_id,
        })
    }

    /// Reconciles the stored correlation id with the backend.
    ///
    /// Only success clears the id. A decline, pending, or a status call that
    /// fails keep it so verification can be repeated.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<PaymentVerification, PaymentError> {
        let Some(merchant_transaction_id) = self.correlation.current()? else {
            warn!("payment status requested without a stored correlation id");
            return Err(PaymentError::MissingCorrelationId);
        };

        let response = self
            .backend
            .check_payment_status(&merchant_transaction_id)
            .await
            .map_err(|e| {
                error!(
                    "payment status check for {} failed: {}",
                    merchant_transaction_id, e
                );
                PaymentError::VerificationFailed {
                    message: VERIFICATION_FAILED_MESSAGE.to_string(),
                    status: e.status_code(),
                    cause: e.to_string(),
                }
            })?;

        let verification = classify(&response);
        match verification.outcome {
            PaymentOutcome::Success => {
                self.correlation.clear()?;
                info!("payment {} confirmed", merchant_transaction_id);
            }
            PaymentOutcome::Pending => {
                info!("payment {} still pending", merchant_transaction_id);
            }
            PaymentOutcome::Failure => {
                warn!(
                    "payment {} declined (status {:?})",
                    merchant_transaction_id, response.status
                );
            }
        }
        Ok(verification)
    }
}

/// Maps a status response to an outcome. `success: true` wins over any
/// status text.
pub fn classify(response: &PaymentStatusResponse) -> PaymentVerification {
    if response.success == Some(true) {
        return PaymentVerification::new(PaymentOutcome::Success, SUCCESS_MESSAGE);
    }
    match normalized_status(response.status.as_ref()).as_str() {
        "success" => PaymentVerification::new(PaymentOutcome::Success, SUCCESS_MESSAGE),
        "pending" => PaymentVerification::new(PaymentOutcome::Pending, PENDING_MESSAGE),
        _ => PaymentVerification::new(PaymentOutcome::Failure, DECLINED_MESSAGE),
    }
}

/// Lowercased text of a scalar status; anything else is empty.
fn normalized_status(status: Option<&Value>) -> String {
    match status {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_common::models::PaymentInitiation;
    use clubhouse_common::services::BoxFuture;
    use clubhouse_common::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(thiserror::Error, Debug)]
    #[error("stub failure {status}")]
    struct StubError {
        status: u16,
        payload: Option<Value>,
    }

    impl ServerPayload for StubError {
        fn server_payload(&self) -> Option<&Value> {
            self.payload.as_ref()
        }
    }

    impl HttpStatusCode for StubError {
        fn status_code(&self) -> u16 {
            self.status
        }
    }

    #[derive(Default)]
    struct StubBackend {
        initiation: Mutex<Option<Result<PaymentInitiation, StubError>>>,
        status: Mutex<Option<Result<PaymentStatusResponse, StubError>>>,
        status_calls: AtomicUsize,
    }

    impl StubBackend {
        fn initiating(result: Result<PaymentInitiation, StubError>) -> Self {
            let stub = Self::default();
            *stub.initiation.lock().unwrap() = Some(result);
            stub
        }

        fn reporting(result: Result<PaymentStatusResponse, StubError>) -> Self {
            let stub = Self::default();
            *stub.status.lock().unwrap() = Some(result);
            stub
        }
    }

    impl PaymentBackend for StubBackend {
        type Error = StubError;

        fn initiate_payment(&self, _transaction_id: i64) -> BoxFuture<'_, PaymentInitiation, StubError> {
            let result = self
                .initiation
                .lock()
                .unwrap()
                .take()
                .expect("unexpected initiate call");
            Box::pin(async move { result })
        }

        fn check_payment_status(
            &self,
            _merchant_transaction_id: &str,
        ) -> BoxFuture<'_, PaymentStatusResponse, StubError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let result = self
                .status
                .lock()
                .unwrap()
                .take()
                .expect("unexpected status call");
            Box::pin(async move { result })
        }
    }

    fn flow(backend: StubBackend) -> PaymentFlow<StubBackend> {
        PaymentFlow::new(backend, CorrelationStore::new(MemoryStore::shared()))
    }

    fn status(json: Value) -> PaymentStatusResponse {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn initiate_stores_id_before_returning_redirect() {
        let flow = flow(StubBackend::initiating(Ok(PaymentInitiation {
            payment_url: Some("https://pay.example/x".into()),
            merchant_transaction_id: Some("MT123".into()),
            ..Default::default()
        })));

        let redirect = flow.initiate(5).await.unwrap();
        assert_eq!(redirect.url, "https://pay.example/x");
        assert_eq!(flow.correlation().current().unwrap().as_deref(), Some("MT123"));
    }

    #[tokio::test]
    async fn initiate_without_url_uses_server_text_or_fallback() {
        let flow_with_text = flow(StubBackend::initiating(Ok(PaymentInitiation {
            error: Some("Transaction already paid".into()),
            ..Default::default()
        })));
        let err = flow_with_text.initiate(5).await.unwrap_err();
        assert_eq!(err.to_string(), "Transaction already paid");

        let bare = flow(StubBackend::initiating(Ok(PaymentInitiation::default())));
        let err = bare.initiate(5).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_REDIRECT_MESSAGE);
        assert_eq!(bare.correlation().current().unwrap(), None);
    }

    #[tokio::test]
    async fn initiate_failure_message_comes_from_payload() {
        let flow = flow(StubBackend::initiating(Err(StubError {
            status: 400,
            payload: Some(json!({"message": "Unknown transaction"})),
        })));
        let err = flow.initiate(5).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown transaction");
        assert_eq!(err.status_code(), 400);

        let flow = self::flow(StubBackend::initiating(Err(StubError {
            status: 502,
            payload: None,
        })));
        let err = flow.initiate(5).await.unwrap_err();
        assert_eq!(err.to_string(), INITIATION_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn verify_without_id_makes_no_call() {
        let backend = StubBackend::default();
        let flow = flow(backend);
        let err = flow.verify().await.unwrap_err();
        assert!(matches!(err, PaymentError::MissingCorrelationId));
        assert_eq!(flow.backend.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_outcomes_and_id_retention() {
        let cases = [
            (json!({"status": "SUCCESS"}), PaymentOutcome::Success, None),
            (json!({"success": true, "status": "weird"}), PaymentOutcome::Success, None),
            (json!({"status": "Pending"}), PaymentOutcome::Pending, Some("MT1")),
            (json!({"status": "declined"}), PaymentOutcome::Failure, Some("MT1")),
            (json!({"status": "FAILED"}), PaymentOutcome::Failure, Some("MT1")),
            (json!({"status": 3}), PaymentOutcome::Failure, Some("MT1")),
        ];
        for (body, expected, remaining) in cases {
            let flow = flow(StubBackend::reporting(Ok(status(body.clone()))));
            flow.correlation().remember("MT1").unwrap();

            let verification = flow.verify().await.unwrap();
            assert_eq!(verification.outcome, expected, "for {body}");
            assert_eq!(
                flow.correlation().current().unwrap().as_deref(),
                remaining,
                "for {body}"
            );
        }
    }

    #[tokio::test]
    async fn verify_transport_failure_keeps_id() {
        let flow = flow(StubBackend::reporting(Err(StubError {
            status: 502,
            payload: None,
        })));
        flow.correlation().remember("MT9").unwrap();

        let err = flow.verify().await.unwrap_err();
        assert_eq!(err.to_string(), VERIFICATION_FAILED_MESSAGE);
        assert_eq!(flow.correlation().current().unwrap().as_deref(), Some("MT9"));
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(
            classify(&status(json!({"status": " success "}))).outcome,
            PaymentOutcome::Success
        );
        assert_eq!(
            classify(&status(json!({}))).message,
            DECLINED_MESSAGE.to_string()
        );
    }
}
