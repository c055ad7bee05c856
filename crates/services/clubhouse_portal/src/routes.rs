// --- File: crates/services/clubhouse_portal/src/routes.rs ---
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::{
    dashboard_handler, login_handler, logout_handler, player_transactions_handler, root_handler,
};
use crate::sessions::require_session;

/// Builds the `/api` router from the shared state.
///
/// Everything except the liveness route and login runs behind
/// [`require_session`].
pub fn api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root_handler))
        .route("/session/login", post(login_handler))
        .with_state(state.clone());

    let member = Router::new()
        .route("/session/logout", post(logout_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/player/transactions", get(player_transactions_handler))
        .with_state(state.clone());

    #[cfg(feature = "payments")]
    let member = member.merge(clubhouse_payments::routes(state.config.clone()));

    let member = member.route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new().nest("/api", public.merge(member))
}
