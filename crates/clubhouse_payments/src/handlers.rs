// --- File: crates/clubhouse_payments/src/handlers.rs ---
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use clubhouse_api::ClubService;
use clubhouse_config::{AppConfig, PaymentsConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::PaymentError;
use crate::logic::{InitiatePaymentRequest, PaymentFlow, PaymentOutcome, PaymentVerification};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// The calling member's flow, supplied per request as an [`Extension`].
pub type MemberFlow = Arc<PaymentFlow<ClubService>>;

// --- State for Payment Handlers ---
#[derive(Clone)]
pub struct PaymentsState {
    pub config: Arc<AppConfig>,
}

impl PaymentsState {
    fn links(&self) -> PaymentsConfig {
        self.config.payments.clone().unwrap_or_default()
    }
}

/// What the status page shows after the gateway sends the member back.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PaymentStatusReport {
    pub outcome: PaymentOutcome,
    pub message: String,
    pub dashboard_path: String,
    /// Only set when the payment failed.
    pub retry_path: Option<String>,
    pub requires_login: bool,
}

impl PaymentStatusReport {
    fn new(verification: PaymentVerification, links: PaymentsConfig, requires_login: bool) -> Self {
        let retry_path =
            (verification.outcome == PaymentOutcome::Failure).then_some(links.retry_path);
        Self {
            outcome: verification.outcome,
            message: verification.message,
            dashboard_path: links.dashboard_path,
            retry_path,
            requires_login,
        }
    }
}

/// Starts a payment and redirects the member to the gateway (303).
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/payments/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 303, description = "Redirect to the payment gateway"),
        (status = 400, description = "The club API rejected the transaction"),
        (status = 401, description = "Session expired, log in again"),
        (status = 502, description = "No gateway URL or club API unreachable"),
        (status = 503, description = "Payments are disabled")
    ),
    tag = "Payments"
))]
pub async fn initiate_payment_handler(
    State(state): State<Arc<PaymentsState>>,
    Extension(flow): Extension<MemberFlow>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<Redirect, PaymentError> {
    if !state.config.use_payments {
        return Err(PaymentError::Disabled);
    }
    let redirect = flow.initiate(payload.transaction_id).await?;
    Ok(Redirect::to(&redirect.url))
}

/// Verifies the payment the member just returned from.
///
/// Every verification result, including "nothing to verify", renders as a
/// report; only storage failures become error responses.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/payment/status",
    responses(
        (status = 200, description = "Outcome of the payment", body = PaymentStatusReport),
        (status = 500, description = "Session storage failed"),
        (status = 503, description = "Payments are disabled")
    ),
    tag = "Payments"
))]
pub async fn payment_status_handler(
    State(state): State<Arc<PaymentsState>>,
    Extension(flow): Extension<MemberFlow>,
) -> Response {
    if !state.config.use_payments {
        return PaymentError::Disabled.into_response();
    }
    let report = match flow.verify().await {
        Ok(verification) => PaymentStatusReport::new(verification, state.links(), false),
        Err(err @ PaymentError::Storage(_)) => return err.into_response(),
        Err(err) => {
            let requires_login = err.requires_login();
            let verification = PaymentVerification {
                outcome: PaymentOutcome::Failure,
                message: err.to_string(),
            };
            PaymentStatusReport::new(verification, state.links(), requires_login)
        }
    };
    info!(outcome = ?report.outcome, "payment status reported");
    Json(report).into_response()
}
