//! Shared setup for the client integration tests.

#![allow(dead_code)]

use clubhouse_api::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use clubhouse_api::{ApiClient, ClubService, Session};
use clubhouse_common::{KeyValueStore, MemoryStore, SharedStore};
use std::sync::Arc;
use wiremock::MockServer;

pub const OLD_TOKEN: &str = "access-old";
pub const NEW_TOKEN: &str = "access-new";
pub const REFRESH_TOKEN: &str = "refresh-1";

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// A store holding an expired access token and a usable refresh token.
pub fn logged_in_store() -> SharedStore {
    let store = MemoryStore::shared();
    store.set(ACCESS_TOKEN_KEY, OLD_TOKEN).unwrap();
    store.set(REFRESH_TOKEN_KEY, REFRESH_TOKEN).unwrap();
    store
}

pub fn service_for(server: &MockServer, store: SharedStore) -> ClubService {
    let session = Arc::new(Session::new(store));
    let client = ApiClient::with_http_client(reqwest::Client::new(), &server.uri(), session)
        .expect("client should build");
    ClubService::new(client)
}
