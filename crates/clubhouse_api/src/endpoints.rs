//! Typed wrappers over the club REST endpoints.

use clubhouse_common::models::{
    Ground, InventoryCategory, InventoryItem, Lineup, LoginResponse, Match, MediaItem,
    PaymentInitiation, PaymentStatusResponse, Player, Team, Transaction,
};
use clubhouse_common::services::{BoxFuture, PaymentBackend};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::{FormPart, PendingRequest};
use crate::session::{Session, SessionProfile};

pub const LOGIN_PATH: &str = "api/auth/login/";
pub const REGISTER_PATH: &str = "api/auth/register/";
pub const PLAYER_DASHBOARD_PATH: &str = "api/auth/dashboard/";
pub const PLAYERS_PATH: &str = "api/players/";
pub const TEAMS_PATH: &str = "api/teams/";
pub const MATCHES_PATH: &str = "api/matches/";
pub const GROUNDS_PATH: &str = "api/grounds/";
pub const INVENTORY_ITEMS_PATH: &str = "api/inventory-items/";
pub const INVENTORY_CATEGORIES_PATH: &str = "api/inventory-categories/";
pub const MEDIA_PATH: &str = "api/media/";
pub const KPIS_PATH: &str = "api/kpis/";
pub const TRANSACTIONS_PATH: &str = "api/transactions/";
pub const SALES_PATH: &str = "api/sales/";
pub const LINEUPS_PATH: &str = "api/lineups/";
pub const INITIATE_PAYMENT_PATH: &str = "api/financials/initiate-payment/";
pub const PAYMENT_CALLBACK_PATH: &str = "api/financials/payment-callback/";

/// Shown for any failed login, whatever the server said.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid phone number or password. Please try again.";

/// What a successful login leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub profile: SessionProfile,
    pub landing_path: String,
}

/// Lineups are queried per match and team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupQuery {
    #[serde(rename = "match")]
    pub match_id: i64,
    pub team: i64,
}

/// A file to attach to a media upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub title: String,
    pub media_type: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Server lists arrive either bare or wrapped in a paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> From<Listing<T>> for Vec<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Bare(items) => items,
            Listing::Paginated { results } => results,
        }
    }
}

/// The club backend, one method per endpoint.
#[derive(Debug, Clone)]
pub struct ClubService {
    client: ApiClient,
}

impl ClubService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let listing: Listing<T> = self.client.get_json(path).await?;
        Ok(listing.into())
    }

    // --- Session ---

    /// Logs in and persists the credentials and profile.
    #[instrument(skip(self, password))]
    pub async fn login(&self, phone_number: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let login: LoginResponse = self
            .client
            .post_json(
                LOGIN_PATH,
                &json!({ "phone_number": phone_number, "password": password }),
            )
            .await?;
        if login.access_token().is_none() {
            warn!("login response carried no access token");
        }
        let profile = self.session().establish(&login, phone_number)?;
        let landing_path = profile.landing_path();
        Ok(LoginOutcome {
            profile,
            landing_path,
        })
    }

    /// Forgets the credentials. No server call is made.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().clear()?;
        Ok(())
    }

    pub fn profile(&self) -> SessionProfile {
        self.session().profile()
    }

    pub async fn register<B: Serialize + ?Sized>(&self, payload: &B) -> Result<Value, ApiError> {
        let created = self.client.post_json(REGISTER_PATH, payload).await?;
        info!("registration accepted");
        Ok(created)
    }

    /// The player-scoped aggregate behind the member portal.
    pub async fn player_dashboard(&self) -> Result<Value, ApiError> {
        self.client.get_json(PLAYER_DASHBOARD_PATH).await
    }

    // --- Players ---

    pub async fn players(&self) -> Result<Vec<Player>, ApiError> {
        self.list(PLAYERS_PATH).await
    }

    pub async fn create_player<B: Serialize + ?Sized>(&self, data: &B) -> Result<Player, ApiError> {
        self.client.post_json(PLAYERS_PATH, data).await
    }

    pub async fn update_player<B: Serialize + ?Sized>(
        &self,
        id: i64,
        data: &B,
    ) -> Result<Player, ApiError> {
        self.client.put_json(&item_path(PLAYERS_PATH, id), data).await
    }

    pub async fn delete_player(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(PLAYERS_PATH, id)).await
    }

    // --- Teams ---

    pub async fn teams(&self) -> Result<Vec<Team>, ApiError> {
        self.list(TEAMS_PATH).await
    }

    pub async fn create_team<B: Serialize + ?Sized>(&self, data: &B) -> Result<Team, ApiError> {
        self.client.post_json(TEAMS_PATH, data).await
    }

    pub async fn update_team<B: Serialize + ?Sized>(&self, id: i64, data: &B) -> Result<Team, ApiError> {
        self.client.put_json(&item_path(TEAMS_PATH, id), data).await
    }

    pub async fn delete_team(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(TEAMS_PATH, id)).await
    }

    /// Raw lineup answer for one match and team. The server may send an
    /// object, an array or nothing.
    pub async fn lineup(&self, query: LineupQuery) -> Result<Value, ApiError> {
        self.client
            .send_json(PendingRequest::get(LINEUPS_PATH).query(&query)?)
            .await
    }

    // --- Matches ---

    pub async fn matches(&self) -> Result<Vec<Match>, ApiError> {
        self.list(MATCHES_PATH).await
    }

    pub async fn create_match<B: Serialize + ?Sized>(&self, data: &B) -> Result<Match, ApiError> {
        self.client.post_json(MATCHES_PATH, data).await
    }

    pub async fn update_match<B: Serialize + ?Sized>(&self, id: i64, data: &B) -> Result<Match, ApiError> {
        self.client.put_json(&item_path(MATCHES_PATH, id), data).await
    }

    pub async fn delete_match(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(MATCHES_PATH, id)).await
    }

    // --- Grounds ---

    pub async fn grounds(&self) -> Result<Vec<Ground>, ApiError> {
        self.list(GROUNDS_PATH).await
    }

    pub async fn create_ground<B: Serialize + ?Sized>(&self, data: &B) -> Result<Ground, ApiError> {
        self.client.post_json(GROUNDS_PATH, data).await
    }

    pub async fn update_ground<B: Serialize + ?Sized>(&self, id: i64, data: &B) -> Result<Ground, ApiError> {
        self.client.put_json(&item_path(GROUNDS_PATH, id), data).await
    }

    pub async fn delete_ground(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(GROUNDS_PATH, id)).await
    }

    // --- Inventory ---

    pub async fn inventory_items(&self) -> Result<Vec<InventoryItem>, ApiError> {
        self.list(INVENTORY_ITEMS_PATH).await
    }

    pub async fn inventory_categories(&self) -> Result<Vec<InventoryCategory>, ApiError> {
        self.list(INVENTORY_CATEGORIES_PATH).await
    }

    pub async fn create_inventory_item<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<InventoryItem, ApiError> {
        self.client.post_json(INVENTORY_ITEMS_PATH, data).await
    }

    pub async fn update_inventory_item<B: Serialize + ?Sized>(
        &self,
        id: i64,
        data: &B,
    ) -> Result<InventoryItem, ApiError> {
        self.client
            .put_json(&item_path(INVENTORY_ITEMS_PATH, id), data)
            .await
    }

    pub async fn delete_inventory_item(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(INVENTORY_ITEMS_PATH, id)).await
    }

    pub async fn record_sale<B: Serialize + ?Sized>(&self, data: &B) -> Result<Value, ApiError> {
        self.client.post_json(SALES_PATH, data).await
    }

    // --- Media ---

    pub async fn media(&self) -> Result<Vec<MediaItem>, ApiError> {
        self.list(MEDIA_PATH).await
    }

    pub async fn upload_media(&self, upload: MediaUpload) -> Result<MediaItem, ApiError> {
        let request = PendingRequest::post(MEDIA_PATH).multipart(vec![
            FormPart::Text {
                name: "title".to_string(),
                value: upload.title,
            },
            FormPart::Text {
                name: "media_type".to_string(),
                value: upload.media_type,
            },
            FormPart::File {
                name: "file".to_string(),
                file_name: upload.file_name,
                mime: upload.mime,
                bytes: upload.bytes,
            },
        ]);
        self.client.send_json(request).await
    }

    pub async fn delete_media(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&item_path(MEDIA_PATH, id)).await
    }

    pub async fn kpis(&self) -> Result<Value, ApiError> {
        self.client.get_json(KPIS_PATH).await
    }

    // --- Financials ---

    pub async fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.list(TRANSACTIONS_PATH).await
    }

    pub async fn record_transaction<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<Transaction, ApiError> {
        self.client.post_json(TRANSACTIONS_PATH, data).await
    }

    pub async fn initiate_payment(&self, transaction_id: i64) -> Result<PaymentInitiation, ApiError> {
        self.client
            .post_json(
                INITIATE_PAYMENT_PATH,
                &json!({ "transaction_id": transaction_id }),
            )
            .await
    }

    pub async fn check_payment_status(
        &self,
        merchant_transaction_id: &str,
    ) -> Result<PaymentStatusResponse, ApiError> {
        self.client
            .post_json(
                PAYMENT_CALLBACK_PATH,
                &json!({ "merchantTransactionId": merchant_transaction_id }),
            )
            .await
    }
}

impl PaymentBackend for ClubService {
    type Error = ApiError;

    fn initiate_payment(&self, transaction_id: i64) -> BoxFuture<'_, PaymentInitiation, ApiError> {
        Box::pin(ClubService::initiate_payment(self, transaction_id))
    }

    fn check_payment_status(
        &self,
        merchant_transaction_id: &str,
    ) -> BoxFuture<'_, PaymentStatusResponse, ApiError> {
        let merchant_transaction_id = merchant_transaction_id.to_string();
        Box::pin(async move {
            ClubService::check_payment_status(self, &merchant_transaction_id).await
        })
    }
}

fn item_path(collection: &str, id: i64) -> String {
    format!("{collection}{id}/")
}

/// Lineup answers keep only the first entry of an array.
pub fn first_lineup(value: Value) -> Option<Lineup> {
    let entry = match value {
        Value::Array(items) => items.into_iter().next()?,
        Value::Null => return None,
        other => other,
    };
    match serde_json::from_value(entry) {
        Ok(lineup) => Some(lineup),
        Err(e) => {
            warn!("ignoring malformed lineup: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_paths_keep_trailing_slash() {
        assert_eq!(item_path(PLAYERS_PATH, 12), "api/players/12/");
        assert_eq!(item_path(INVENTORY_ITEMS_PATH, 3), "api/inventory-items/3/");
    }

    #[test]
    fn listings_accept_paginated_envelopes() {
        let bare: Listing<Ground> = serde_json::from_value(json!([{"id": 1, "name": "North"}])).unwrap();
        let paged: Listing<Ground> =
            serde_json::from_value(json!({"count": 1, "results": [{"id": 1, "name": "North"}]}))
                .unwrap();
        assert_eq!(Vec::from(bare), Vec::from(paged));
    }

    #[test]
    fn first_lineup_takes_head_of_arrays() {
        let lineup = first_lineup(json!([
            {"id": 4, "match": 9, "team": 2, "players": [1, 2]},
            {"id": 5, "match": 9, "team": 2}
        ]))
        .unwrap();
        assert_eq!(lineup.id, Some(4));
        assert_eq!(lineup.match_id, Some(9));

        assert!(first_lineup(json!([])).is_none());
        assert!(first_lineup(Value::Null).is_none());
        assert_eq!(first_lineup(json!({"id": 6})).unwrap().id, Some(6));
    }
}
