// --- File: crates/services/clubhouse_portal/src/lib.rs ---
pub mod app_state;
pub mod handlers;
pub mod routes;
pub mod sessions; // Cookie-keyed credentials and payment slots

pub use app_state::{AppState, StartupError};
pub use routes::api_router;
pub use sessions::{BrowserSession, SessionRegistry, SESSION_COOKIE};
