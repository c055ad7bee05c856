// --- File: crates/services/clubhouse_portal/src/handlers.rs ---
use axum::{extract::State, http::StatusCode, response::Response, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use clubhouse_api::endpoints::LOGIN_FAILED_MESSAGE;
use clubhouse_api::loaders::{
    load_admin_dashboard, load_player_transactions, AdminDashboard, PlayerTransactions,
};
use clubhouse_api::LoginOutcome;
use clubhouse_common::{handle_json_result, ClubhouseError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::sessions::{BrowserSession, SESSION_COOKIE};

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

pub async fn root_handler() -> &'static str {
    "Welcome to the Clubhouse portal API!"
}

/// Logs in against the club API and binds the credentials to the caller's
/// session cookie. Every failure reads the same to the user.
#[axum::debug_handler]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginOutcome>), ClubhouseError> {
    let existing = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.find(cookie.value())?,
        None => None,
    };
    let (session, started) = match existing {
        Some(session) => (session, false),
        None => (state.sessions.create()?, true),
    };

    match session
        .service
        .login(&payload.phone_number, &payload.password)
        .await
    {
        Ok(outcome) => {
            info!(session = %session.id, landing = %outcome.landing_path, "login succeeded");
            let cookie = state.sessions.session_cookie(session.id);
            Ok((jar.add(cookie), Json(outcome)))
        }
        Err(err) => {
            warn!("login failed: {}", err);
            if started {
                if let Err(e) = state.sessions.remove(session.id) {
                    warn!("could not discard session {}: {}", session.id, e);
                }
            }
            Err(ClubhouseError::AuthError(LOGIN_FAILED_MESSAGE.to_string()))
        }
    }
}

#[axum::debug_handler]
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<BrowserSession>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ClubhouseError> {
    session.service.logout()?;
    state.sessions.remove(session.id)?;
    Ok((jar.remove(state.sessions.clear_session_cookie()), StatusCode::NO_CONTENT))
}

#[axum::debug_handler]
pub async fn dashboard_handler(
    Extension(session): Extension<Arc<BrowserSession>>,
) -> Result<Json<AdminDashboard>, Response> {
    handle_json_result(load_admin_dashboard(&session.service).await)
}

#[axum::debug_handler]
pub async fn player_transactions_handler(
    Extension(session): Extension<Arc<BrowserSession>>,
) -> Result<Json<PlayerTransactions>, Response> {
    handle_json_result(load_player_transactions(&session.service).await)
}
