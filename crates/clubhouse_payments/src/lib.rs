// --- File: crates/clubhouse_payments/src/lib.rs ---
pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod routes;
pub mod store;

pub use error::PaymentError;
pub use handlers::{MemberFlow, PaymentStatusReport, PaymentsState};
pub use logic::{ExternalRedirect, InitiatePaymentRequest, PaymentFlow, PaymentOutcome, PaymentVerification};
pub use routes::routes;
pub use store::CorrelationStore;
