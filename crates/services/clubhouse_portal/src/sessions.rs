// --- File: crates/services/clubhouse_portal/src/sessions.rs ---
//! Per-browser portal sessions.
//!
//! Each browser is identified by an opaque `clubhouse_session` cookie. The
//! cookie maps to a [`BrowserSession`] owning its own credential pair and
//! its own payment correlation slot, so callers never see each other's
//! tokens or pending payments.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use clubhouse_api::{ApiClient, ClubService, Session};
use clubhouse_common::{
    create_client, ClubhouseError, FileStore, MemoryStore, SharedStore, StorageError,
};
use clubhouse_config::AppConfig;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "payments")]
use clubhouse_payments::{CorrelationStore, MemberFlow, PaymentFlow};

use crate::app_state::{AppState, StartupError};

pub const SESSION_COOKIE: &str = "clubhouse_session";

/// Returned to callers without a known session cookie.
pub const NO_SESSION_MESSAGE: &str = "Please log in to continue.";

/// One browser's view of the club API.
pub struct BrowserSession {
    pub id: Uuid,
    pub service: ClubService,
    /// Correlation id storage scoped to this browser.
    #[cfg(feature = "payments")]
    pub payments: MemberFlow,
}

/// Live portal sessions, keyed by cookie value.
///
/// With a sessions directory configured, credentials persist to
/// `<dir>/<id>.json` and a known cookie is restored from there after a
/// restart. Correlation ids are never persisted.
pub struct SessionRegistry {
    http: reqwest::Client,
    base_url: String,
    sessions_dir: Option<PathBuf>,
    secure_cookies: bool,
    sessions: Mutex<HashMap<Uuid, Arc<BrowserSession>>>,
}

impl SessionRegistry {
    pub fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let http = create_client(&config.api)?;
        let base_url = config.api.normalized_base_url();
        // Rejects a malformed base URL at startup instead of on first login.
        ApiClient::with_http_client(
            http.clone(),
            &base_url,
            Arc::new(Session::new(MemoryStore::shared())),
        )?;

        let sessions_dir = config.storage.sessions_dir.as_deref().map(PathBuf::from);
        match &sessions_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                    path: dir.clone(),
                    source,
                })?;
                info!("persisting portal sessions in {}", dir.display());
            }
            None => info!("portal sessions are kept in memory"),
        }

        Ok(Self {
            http,
            base_url,
            sessions_dir,
            secure_cookies: config.server.secure_cookies,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Starts a session with empty credentials.
    pub fn create(&self) -> Result<Arc<BrowserSession>, ClubhouseError> {
        let id = Uuid::new_v4();
        let session = self.build(id)?;
        self.lock()?.insert(id, session.clone());
        info!(session = %id, "portal session started");
        Ok(session)
    }

    /// Looks up the session behind a cookie value. Malformed and unknown
    /// values resolve to `None`.
    pub fn find(&self, cookie_value: &str) -> Result<Option<Arc<BrowserSession>>, ClubhouseError> {
        let Ok(id) = Uuid::parse_str(cookie_value) else {
            debug!("ignoring malformed session cookie");
            return Ok(None);
        };
        if let Some(found) = self.lock()?.get(&id) {
            return Ok(Some(found.clone()));
        }

        let Some(path) = self.credentials_path(id) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let restored = self.build(id)?;
        info!(session = %id, "portal session restored from disk");
        Ok(Some(self.lock()?.entry(id).or_insert(restored).clone()))
    }

    /// Forgets a session and deletes its credentials file.
    pub fn remove(&self, id: Uuid) -> Result<(), ClubhouseError> {
        self.lock()?.remove(&id);
        if let Some(path) = self.credentials_path(id) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StorageError::Io { path, source }.into()),
            }
        }
        info!(session = %id, "portal session ended");
        Ok(())
    }

    pub fn session_cookie(&self, id: Uuid) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .path("/")
            .build()
    }

    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }

    fn build(&self, id: Uuid) -> Result<Arc<BrowserSession>, ClubhouseError> {
        let credentials: SharedStore = match self.credentials_path(id) {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => MemoryStore::shared(),
        };
        let client = ApiClient::with_http_client(
            self.http.clone(),
            &self.base_url,
            Arc::new(Session::new(credentials)),
        )?;
        let service = ClubService::new(client);
        Ok(Arc::new(BrowserSession {
            id,
            #[cfg(feature = "payments")]
            payments: Arc::new(PaymentFlow::new(
                service.clone(),
                CorrelationStore::new(MemoryStore::shared()),
            )),
            service,
        }))
    }

    fn credentials_path(&self, id: Uuid) -> Option<PathBuf> {
        self.sessions_dir
            .as_ref()
            .map(|dir| dir.join(format!("{id}.json")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Arc<BrowserSession>>>, ClubhouseError> {
        self.sessions
            .lock()
            .map_err(|_| StorageError::Poisoned.into())
    }
}

/// Resolves the caller's session from its cookie and hands it to the
/// handlers as request extensions. Callers without one get a 401.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let found = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.find(cookie.value()),
        None => Ok(None),
    };
    match found {
        Ok(Some(session)) => {
            #[cfg(feature = "payments")]
            request.extensions_mut().insert(session.payments.clone());
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(None) => {
            debug!("rejecting request without a portal session");
            ClubhouseError::AuthError(NO_SESSION_MESSAGE.to_string()).into_response()
        }
        Err(err) => {
            warn!("session lookup failed: {}", err);
            err.into_response()
        }
    }
}
