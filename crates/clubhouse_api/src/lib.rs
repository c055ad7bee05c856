// --- File: crates/clubhouse_api/src/lib.rs ---

pub mod client; // Bearer auth and single-flight refresh
pub mod endpoints; // Typed club endpoints
pub mod error;
pub mod loaders; // Concurrent page loads
pub mod request;
pub mod session; // Credential pair and profile

pub use client::{ApiClient, REFRESH_PATH};
pub use endpoints::{ClubService, LineupQuery, LoginOutcome, MediaUpload};
pub use error::{ApiError, RefreshFailure, UnauthorizedReason};
pub use request::{FormPart, PendingRequest, RequestBody};
pub use session::{Session, SessionPhase, SessionProfile};
