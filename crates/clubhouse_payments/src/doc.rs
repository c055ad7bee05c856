// File: crates/clubhouse_payments/src/doc.rs

#[cfg(feature = "openapi")]
use utoipa::OpenApi;

#[cfg(feature = "openapi")]
use crate::handlers::PaymentStatusReport;
#[cfg(feature = "openapi")]
use crate::logic::{InitiatePaymentRequest, PaymentOutcome};

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::initiate_payment_handler,
        crate::handlers::payment_status_handler
    ),
    components(
        schemas(InitiatePaymentRequest, PaymentStatusReport, PaymentOutcome)
    ),
    tags(
        (name = "Payments", description = "Membership and fee payments through the club gateway")
    )
)]
pub struct PaymentsApiDoc;
