//! Page-load fan-out: several endpoints fetched concurrently and folded into
//! one view model.
//!
//! Fail-fast loads use `tokio::try_join!`, so the first rejection is returned
//! as soon as it arrives while the remaining requests are dropped. The lineup
//! load settles every request and keeps what succeeded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clubhouse_common::models::{Ground, Lineup, Match, Player, Team, Transaction};
use futures::future::join_all;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use crate::endpoints::{first_lineup, ClubService, LineupQuery};
use crate::error::ApiError;

const UPCOMING_MATCHES: usize = 3;
const RECENT_TRANSACTIONS: usize = 4;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminDashboard {
    pub player_count: usize,
    pub active_members: usize,
    pub team_count: usize,
    pub upcoming_matches: Vec<Match>,
    pub recent_transactions: Vec<Transaction>,
    pub pending_invoices: Vec<Transaction>,
    pub total_revenue: f64,
    pub team_names: BTreeMap<i64, String>,
    pub ground_names: BTreeMap<i64, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerLookups {
    pub players: Vec<Player>,
    pub player_names: BTreeMap<i64, String>,
    pub ground_names: BTreeMap<i64, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadedLineup {
    pub query: LineupQuery,
    pub lineup: Lineup,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TransactionTotals {
    pub paid: f64,
    pub pending: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerTransactions {
    pub player_id: Option<i64>,
    pub transactions: Vec<Transaction>,
    pub totals: TransactionTotals,
}

/// Loads everything the admin dashboard shows. Any failed request fails the
/// whole load.
#[instrument(skip(service))]
pub async fn load_admin_dashboard(service: &ClubService) -> Result<AdminDashboard, ApiError> {
    let (players, teams, matches, transactions, grounds) = tokio::try_join!(
        service.players(),
        service.teams(),
        service.matches(),
        service.transactions(),
        service.grounds(),
    )?;
    debug!(
        players = players.len(),
        matches = matches.len(),
        transactions = transactions.len(),
        "dashboard data loaded"
    );
    Ok(summarize_dashboard(
        players,
        teams,
        matches,
        transactions,
        grounds,
        Utc::now(),
    ))
}

/// Folds the raw collections into dashboard figures as of `now`.
pub fn summarize_dashboard(
    players: Vec<Player>,
    teams: Vec<Team>,
    matches: Vec<Match>,
    transactions: Vec<Transaction>,
    grounds: Vec<Ground>,
    now: DateTime<Utc>,
) -> AdminDashboard {
    let active_members = players.iter().filter(|p| p.membership_active).count();

    let mut upcoming: Vec<(DateTime<Utc>, Match)> = matches
        .into_iter()
        .filter_map(|m| {
            let kickoff = m.date.as_deref().and_then(parse_timestamp)?;
            (kickoff > now).then_some((kickoff, m))
        })
        .collect();
    upcoming.sort_by_key(|(kickoff, _)| *kickoff);
    let upcoming_matches = upcoming
        .into_iter()
        .take(UPCOMING_MATCHES)
        .map(|(_, m)| m)
        .collect();

    let total_revenue: f64 = transactions
        .iter()
        .filter(|t| t.paid)
        .map(Transaction::amount_value)
        .sum();

    let mut pending_invoices: Vec<Transaction> =
        transactions.iter().filter(|t| !t.paid).cloned().collect();
    pending_invoices.sort_by(|a, b| compare_dates(a.payment_date.as_deref(), b.payment_date.as_deref()));

    let mut recent_transactions = transactions;
    recent_transactions
        .sort_by(|a, b| compare_dates(b.payment_date.as_deref(), a.payment_date.as_deref()));
    recent_transactions.truncate(RECENT_TRANSACTIONS);

    AdminDashboard {
        player_count: players.len(),
        active_members,
        team_count: teams.len(),
        upcoming_matches,
        recent_transactions,
        pending_invoices,
        total_revenue,
        team_names: teams.iter().map(|t| (t.id, t.display_name())).collect(),
        ground_names: grounds.iter().map(|g| (g.id, g.display_name())).collect(),
    }
}

/// Players and grounds for the member portal's name lookups. Fail-fast.
#[instrument(skip(service))]
pub async fn load_player_lookups(service: &ClubService) -> Result<PlayerLookups, ApiError> {
    let (players, grounds) = tokio::try_join!(service.players(), service.grounds())?;
    let player_names = players.iter().map(|p| (p.id, p.display_name())).collect();
    let ground_names = grounds.iter().map(|g| (g.id, g.display_name())).collect();
    Ok(PlayerLookups {
        players,
        player_names,
        ground_names,
    })
}

/// Fetches one lineup per query. Failed or empty answers are logged and
/// left out; the result keeps the order of `queries`.
#[instrument(skip(service, queries), fields(count = queries.len()))]
pub async fn load_lineups(service: &ClubService, queries: &[LineupQuery]) -> Vec<LoadedLineup> {
    let settled = join_all(queries.iter().map(|query| async move {
        (*query, service.lineup(*query).await)
    }))
    .await;

    settled
        .into_iter()
        .filter_map(|(query, result)| match result {
            Ok(value) => first_lineup(value).map(|lineup| LoadedLineup { query, lineup }),
            Err(e) => {
                warn!(
                    match_id = query.match_id,
                    team = query.team,
                    "lineup request failed: {}",
                    e
                );
                None
            }
        })
        .collect()
}

/// The logged-in player's transactions. Without a stored player id every
/// transaction the server returns is kept.
#[instrument(skip(service))]
pub async fn load_player_transactions(
    service: &ClubService,
) -> Result<PlayerTransactions, ApiError> {
    let player_id = service.profile().player_id;
    let all = service.transactions().await?;
    let transactions: Vec<Transaction> = match player_id {
        Some(id) => all.into_iter().filter(|t| t.player == Some(id)).collect(),
        None => all,
    };
    let totals = totals_for(&transactions);
    Ok(PlayerTransactions {
        player_id,
        transactions,
        totals,
    })
}

pub fn totals_for(transactions: &[Transaction]) -> TransactionTotals {
    transactions
        .iter()
        .fold(TransactionTotals::default(), |mut totals, t| {
            if t.paid {
                totals.paid += t.amount_value();
            } else {
                totals.pending += t.amount_value();
            }
            totals
        })
}

/// Accepts RFC 3339, naive date-times and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Orders by parsed date; unparsable dates sort first.
fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    a.and_then(parse_timestamp).cmp(&b.and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn dashboard_figures() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let players: Vec<Player> = from_json(json!([
            {"id": 1, "membership_active": true},
            {"id": 2, "membership_active": false},
            {"id": 3, "membership_active": true}
        ]));
        let teams: Vec<Team> = from_json(json!([{"id": 10, "name": "First XI"}]));
        let matches: Vec<Match> = from_json(json!([
            {"id": 1, "date": "2026-02-01"},
            {"id": 2, "date": "2026-04-01T10:00:00Z"},
            {"id": 3, "date": "2026-03-02"},
            {"id": 4, "date": "2026-05-01"},
            {"id": 5, "date": "2026-06-01"},
            {"id": 6}
        ]));
        let transactions: Vec<Transaction> = from_json(json!([
            {"id": 1, "amount": "100.00", "paid": true, "payment_date": "2026-01-05"},
            {"id": 2, "amount": "50.50", "paid": true, "payment_date": "2026-02-05"},
            {"id": 3, "amount": "75", "paid": false, "payment_date": "2026-02-20"},
            {"id": 4, "amount": "20", "paid": false, "payment_date": "2026-01-20"},
            {"id": 5, "amount": "5", "paid": true, "payment_date": "2025-12-01"}
        ]));
        let grounds: Vec<Ground> = from_json(json!([{"id": 7, "name": "North"}, {"id": 8}]));

        let dashboard = summarize_dashboard(players, teams, matches, transactions, grounds, now);

        assert_eq!(dashboard.player_count, 3);
        assert_eq!(dashboard.active_members, 2);
        assert_eq!(dashboard.team_count, 1);
        assert_eq!(
            dashboard.upcoming_matches.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![3, 2, 4]
        );
        assert_eq!(dashboard.total_revenue, 155.5);
        assert_eq!(
            dashboard.pending_invoices.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![4, 3]
        );
        assert_eq!(
            dashboard.recent_transactions.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![3, 2, 4, 1]
        );
        assert_eq!(dashboard.team_names.get(&10).map(String::as_str), Some("First XI"));
        assert_eq!(dashboard.ground_names.get(&8).map(String::as_str), Some("Ground #8"));
    }

    #[test]
    fn totals_split_paid_and_pending() {
        let transactions: Vec<Transaction> = from_json(json!([
            {"id": 1, "amount": "10.5", "paid": true},
            {"id": 2, "amount": "4.5", "paid": false},
            {"id": 3, "paid": false}
        ]));
        assert_eq!(
            totals_for(&transactions),
            TransactionTotals {
                paid: 10.5,
                pending: 4.5
            }
        );
    }

    #[test]
    fn timestamps_in_several_shapes() {
        assert!(parse_timestamp("2026-03-01T10:00:00+05:30").is_some());
        assert!(parse_timestamp("2026-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2026-03-01 10:00:00").is_some());
        assert_eq!(
            parse_timestamp("2026-03-01"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
        assert!(parse_timestamp("soon").is_none());
    }
}
