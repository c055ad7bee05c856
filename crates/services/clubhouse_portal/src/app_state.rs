// --- File: crates/services/clubhouse_portal/src/app_state.rs ---
use clubhouse_common::StorageError;
use clubhouse_config::AppConfig;
use std::sync::Arc;

use crate::sessions::SessionRegistry;

/// State shared by every portal route. Per-caller state lives in the
/// [`SessionRegistry`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, StartupError> {
        let sessions = SessionRegistry::new(&config)?;
        Ok(Self {
            config,
            sessions: Arc::new(sessions),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to prepare session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid club API settings: {0}")]
    Client(#[from] clubhouse_api::ApiError),
}
