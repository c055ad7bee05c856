//! Service abstractions for the club backend.
//!
//! Flows that only need a narrow slice of the API depend on these traits
//! instead of the concrete client, so they can be exercised against a stub.

use std::future::Future;
use std::pin::Pin;

use crate::error::{HttpStatusCode, ServerPayload};
use crate::models::{PaymentInitiation, PaymentStatusResponse};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// The two payment endpoints of the club backend.
pub trait PaymentBackend: Send + Sync {
    /// Error type returned by backend calls.
    type Error: std::error::Error + ServerPayload + HttpStatusCode + Send + Sync + 'static;

    /// Asks the backend to open a gateway session for a pending transaction.
    fn initiate_payment(
        &self,
        transaction_id: i64,
    ) -> BoxFuture<'_, PaymentInitiation, Self::Error>;

    /// Asks the backend for the outcome of a gateway session.
    fn check_payment_status(
        &self,
        merchant_transaction_id: &str,
    ) -> BoxFuture<'_, PaymentStatusResponse, Self::Error>;
}
