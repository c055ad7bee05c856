// --- File: crates/clubhouse_common/src/models.rs ---

// Read models for the club REST API. The server owns all of these; fields
// the UI never relies on are left out and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A club member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Player {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub membership_active: bool,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub teams: Vec<Value>,
}

impl Player {
    /// "First Last", or `Player #<id>` when the server has no name.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let full = full.trim();
        if full.is_empty() {
            format!("Player #{}", self.id)
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Team {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub captain: Option<i64>,
    #[serde(default)]
    pub captain_name: Option<String>,
    #[serde(default)]
    pub players: Vec<Value>,
}

impl Team {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Team #{}", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ground {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Ground {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Ground #{}", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Match {
    pub id: i64,
    /// ISO-8601 kick-off date/time as sent by the server.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub team: Option<i64>,
    #[serde(default)]
    pub ground: Option<i64>,
    #[serde(default)]
    pub ground_name: Option<String>,
    #[serde(default)]
    pub external_opponent: Option<String>,
    #[serde(default)]
    pub reporting_time: Option<String>,
    #[serde(default)]
    pub team_dress: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventoryCategory {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventoryItem {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub available_quantity: Option<i64>,
    #[serde(default)]
    pub distributed_quantity: Option<i64>,
    #[serde(default)]
    pub missing_quantity: Option<i64>,
    #[serde(default)]
    pub destroyed_quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MediaItem {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    /// URL of the uploaded file.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// A fee or membership charge. `amount` is a decimal string on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Transaction {
    pub id: i64,
    /// Owning player id.
    #[serde(default)]
    pub player: Option<i64>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl Transaction {
    /// The amount as a number; unparsable or missing amounts count as zero.
    pub fn amount_value(&self) -> f64 {
        self.amount
            .as_deref()
            .and_then(|a| a.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

/// One team's lineup for one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Lineup {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "match", default)]
    pub match_id: Option<i64>,
    #[serde(default)]
    pub team: Option<i64>,
    #[serde(default)]
    pub players: Vec<Value>,
}

/// Body of a successful `api/auth/login/` call.
///
/// Older deployments answer with `token` instead of `access`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub player_id: Option<i64>,
    #[serde(default)]
    pub player_role: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub dashboard_url: Option<String>,
}

impl LoginResponse {
    pub fn access_token(&self) -> Option<&str> {
        self.access
            .as_deref()
            .or(self.token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Body of `api/auth/token/refresh/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
}

/// Body of `api/financials/initiate-payment/`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentInitiation {
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `api/financials/payment-callback/`.
///
/// `status` is kept raw because gateways send strings, numbers or nothing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_amount_parses_decimal_strings() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 1, "player": 7, "amount": "1500.50", "paid": false,
            "category": "Membership", "payment_date": "2026-01-10"
        }))
        .unwrap();
        assert_eq!(tx.amount_value(), 1500.5);
        assert!(tx.due_date.is_none());

        let broken = Transaction { amount: Some("n/a".into()), ..tx };
        assert_eq!(broken.amount_value(), 0.0);
    }

    #[test]
    fn login_response_accepts_legacy_token_field() {
        let login: LoginResponse =
            serde_json::from_value(json!({"token": "legacy", "role": "admin"})).unwrap();
        assert_eq!(login.access_token(), Some("legacy"));
    }

    #[test]
    fn player_display_name_falls_back_to_id() {
        let player: Player = serde_json::from_value(json!({"id": 9})).unwrap();
        assert_eq!(player.display_name(), "Player #9");
        let player: Player =
            serde_json::from_value(json!({"id": 9, "first_name": "Asha", "last_name": "Rao"}))
                .unwrap();
        assert_eq!(player.display_name(), "Asha Rao");
    }

    #[test]
    fn nameless_records_still_decode() {
        let team: Team = serde_json::from_value(json!({"id": 5, "captain": 1})).unwrap();
        assert_eq!(team.display_name(), "Team #5");
        let category: InventoryCategory = serde_json::from_value(json!({"id": 2})).unwrap();
        assert!(category.name.is_none());
        let item: InventoryItem = serde_json::from_value(json!({"id": 7, "category": 2})).unwrap();
        assert!(item.name.is_none());
    }
}
