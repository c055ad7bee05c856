//! The session context: credential pair, profile and authentication phase.
//!
//! All reads and writes of the persisted credentials go through [`Session`].
//! The client receives the session at construction and is the only writer of
//! the access token after login.

use clubhouse_common::models::LoginResponse;
use clubhouse_common::{SharedStore, StorageError};
use serde::Serialize;
use std::sync::RwLock;
use tracing::{debug, info, warn};

pub const ACCESS_TOKEN_KEY: &str = "club_token";
pub const REFRESH_TOKEN_KEY: &str = "club_refresh_token";
pub const USER_NAME_KEY: &str = "club_user_name";
pub const USER_ROLE_KEY: &str = "club_user_role";
pub const DASHBOARD_URL_KEY: &str = "club_dashboard_url";
pub const PLAYER_ID_KEY: &str = "club_player_id";
pub const PLAYER_ROLE_KEY: &str = "club_player_role";

/// Every key a logout must remove.
pub const PERSISTED_KEYS: [&str; 7] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USER_NAME_KEY,
    USER_ROLE_KEY,
    DASHBOARD_URL_KEY,
    PLAYER_ID_KEY,
    PLAYER_ROLE_KEY,
];

/// Where the authentication state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    Authenticated,
    RefreshInFlight,
    /// A refresh failed; the user has to log in again.
    AuthenticationExpired,
}

/// Display data persisted next to the credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionProfile {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub dashboard_url: Option<String>,
    pub player_id: Option<i64>,
    pub player_role: Option<String>,
}

impl SessionProfile {
    pub fn is_player(&self) -> bool {
        self.role.as_deref() == Some("player")
    }

    /// Path to send the user to after login.
    pub fn landing_path(&self) -> String {
        if let Some(url) = &self.dashboard_url {
            return url.clone();
        }
        if self.is_player() {
            "/".to_string()
        } else {
            "/dashboard".to_string()
        }
    }
}

pub struct Session {
    store: SharedStore,
    phase: RwLock<SessionPhase>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wraps persistent storage. A stored access token from an earlier run
    /// starts the session as authenticated.
    pub fn new(store: SharedStore) -> Self {
        let phase = match store.get(ACCESS_TOKEN_KEY) {
            Ok(Some(_)) => SessionPhase::Authenticated,
            Ok(None) => SessionPhase::Unauthenticated,
            Err(e) => {
                warn!("could not read stored credentials: {}", e);
                SessionPhase::Unauthenticated
            }
        };
        Self {
            store,
            phase: RwLock::new(phase),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
            .read()
            .map(|p| *p)
            .unwrap_or(SessionPhase::Unauthenticated)
    }

    pub(crate) fn set_phase(&self, phase: SessionPhase) {
        if let Ok(mut current) = self.phase.write() {
            if *current != phase {
                debug!("session phase {:?} -> {:?}", *current, phase);
                *current = phase;
            }
        }
    }

    /// The stored access token. Storage failures read as "no token".
    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Replaces the access token after a successful refresh.
    pub(crate) fn store_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, token)?;
        self.set_phase(SessionPhase::Authenticated);
        Ok(())
    }

    /// Persists what a successful login returned.
    ///
    /// `typed_phone_number` is the last resort for the display name.
    pub fn establish(
        &self,
        login: &LoginResponse,
        typed_phone_number: &str,
    ) -> Result<SessionProfile, StorageError> {
        if let Some(access) = login.access_token() {
            self.store.set(ACCESS_TOKEN_KEY, access)?;
        }
        if let Some(refresh) = login.refresh.as_deref().filter(|r| !r.is_empty()) {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }

        let display_name = display_name_for(login, typed_phone_number);
        self.store.set(USER_NAME_KEY, &display_name)?;

        if let Some(player_id) = login.player_id {
            self.store.set(PLAYER_ID_KEY, &player_id.to_string())?;
        }
        if let Some(player_role) = login.player_role.as_deref().filter(|r| !r.is_empty()) {
            self.store.set(PLAYER_ROLE_KEY, player_role)?;
        }
        if let Some(role) = login.role.as_deref().filter(|r| !r.is_empty()) {
            self.store.set(USER_ROLE_KEY, role)?;
        }
        if let Some(url) = accepted_dashboard_url(login.dashboard_url.as_deref()) {
            self.store.set(DASHBOARD_URL_KEY, url)?;
        }

        if login.access_token().is_some() {
            self.set_phase(SessionPhase::Authenticated);
        }
        info!("session established for {}", display_name);
        Ok(self.profile())
    }

    /// Removes every persisted key.
    pub fn clear(&self) -> Result<(), StorageError> {
        for key in PERSISTED_KEYS {
            self.store.remove(key)?;
        }
        self.set_phase(SessionPhase::Unauthenticated);
        info!("session cleared");
        Ok(())
    }

    pub fn profile(&self) -> SessionProfile {
        SessionProfile {
            display_name: self.read(USER_NAME_KEY),
            role: self.read(USER_ROLE_KEY),
            dashboard_url: accepted_dashboard_url(self.read(DASHBOARD_URL_KEY).as_deref())
                .map(str::to_string),
            player_id: self
                .read(PLAYER_ID_KEY)
                .and_then(|id| id.trim().parse::<i64>().ok()),
            player_role: self.read(PLAYER_ROLE_KEY),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("could not read {}: {}", key, e);
                None
            }
        }
    }
}

/// Dashboard URLs pointing into the API are backend links, not pages.
fn accepted_dashboard_url(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.is_empty() && !u.starts_with("/api/"))
}

fn display_name_for(login: &LoginResponse, typed_phone_number: &str) -> String {
    let full = [login.first_name.as_deref(), login.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let full = full.trim();
    if !full.is_empty() {
        return full.to_string();
    }
    [
        login.full_name.as_deref(),
        login.name.as_deref(),
        login.username.as_deref(),
        login.phone_number.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or(typed_phone_number)
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_common::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn login(json: serde_json::Value) -> LoginResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn establish_persists_credentials_and_profile() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);

        let profile = session
            .establish(
                &login(serde_json::json!({
                    "access": "a-1", "refresh": "r-1",
                    "first_name": "Asha", "last_name": "Rao",
                    "player_id": 42, "player_role": "captain", "role": "player",
                    "dashboard_url": "/player/dashboard"
                })),
                "9990001111",
            )
            .unwrap();

        assert_eq!(session.access_token().as_deref(), Some("a-1"));
        assert_eq!(session.refresh_token().as_deref(), Some("r-1"));
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(profile.display_name.as_deref(), Some("Asha Rao"));
        assert_eq!(profile.player_id, Some(42));
        assert_eq!(profile.landing_path(), "/player/dashboard");
        assert_eq!(store.get(PLAYER_ROLE_KEY).unwrap().as_deref(), Some("captain"));
    }

    #[test]
    fn api_dashboard_urls_are_ignored() {
        let session = Session::new(MemoryStore::shared());
        let profile = session
            .establish(
                &login(serde_json::json!({
                    "token": "legacy", "role": "player",
                    "dashboard_url": "/api/auth/dashboard/"
                })),
                "9990001111",
            )
            .unwrap();
        assert_eq!(profile.dashboard_url, None);
        assert_eq!(profile.landing_path(), "/");
        assert_eq!(profile.display_name.as_deref(), Some("9990001111"));
        assert_eq!(session.access_token().as_deref(), Some("legacy"));
    }

    #[test]
    fn staff_without_dashboard_land_on_admin_dashboard() {
        let session = Session::new(MemoryStore::shared());
        let profile = session
            .establish(
                &login(serde_json::json!({"access": "a", "role": "admin", "username": "coach"})),
                "000",
            )
            .unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("coach"));
        assert_eq!(profile.landing_path(), "/dashboard");
    }

    #[test]
    fn clear_removes_every_key() {
        let store = Arc::new(MemoryStore::new());
        for key in PERSISTED_KEYS {
            store.set(key, "x").unwrap();
        }
        let session = Session::new(store.clone());
        assert_eq!(session.phase(), SessionPhase::Authenticated);

        session.clear().unwrap();
        for key in PERSISTED_KEYS {
            assert_eq!(store.get(key).unwrap(), None, "{key} survived logout");
        }
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert_eq!(session.profile(), SessionProfile::default());
    }
}
