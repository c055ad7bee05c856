// --- File: crates/clubhouse_payments/src/routes.rs ---

use axum::{
    routing::{get, post},
    Router,
};
use clubhouse_config::AppConfig;
use std::sync::Arc;

use crate::handlers::{initiate_payment_handler, payment_status_handler, PaymentsState};

/// Creates a router containing the payment routes.
///
/// The handlers read the calling member's flow from a
/// [`MemberFlow`](crate::handlers::MemberFlow) request extension; the
/// embedding service layers it in after resolving who is calling.
///
/// # Arguments
/// * `config` - Shared application configuration (`Arc<AppConfig>`).
pub fn routes(config: Arc<AppConfig>) -> Router {
    let payments_state = Arc::new(PaymentsState { config });

    Router::new()
        // Called by the portal UI; answers with a redirect to the gateway
        .route("/payments/initiate", post(initiate_payment_handler))
        // The gateway sends the member's browser back here
        .route("/payment/status", get(payment_status_handler))
        .with_state(payments_state)
}
