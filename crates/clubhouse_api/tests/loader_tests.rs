mod common;

use clubhouse_api::loaders::{
    load_admin_dashboard, load_lineups, load_player_lookups, load_player_transactions,
};
use clubhouse_api::session::PLAYER_ID_KEY;
use clubhouse_api::{ApiError, LineupQuery};
use clubhouse_common::KeyValueStore;
use common::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_list(server: &MockServer, route: &str, body: serde_json::Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}

#[tokio::test]
async fn dashboard_fan_out_surfaces_slow_rejection() {
    let server = MockServer::start().await;
    let stall = Duration::from_secs(30);
    mount_list(&server, "/api/players/", json!([]), stall).await;
    mount_list(&server, "/api/teams/", json!([]), stall).await;
    mount_list(&server, "/api/matches/", json!([]), stall).await;
    mount_list(&server, "/api/grounds/", json!([]), stall).await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": "ledger offline"}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let service = service_for(&server, logged_in_store());
    let outcome = tokio::time::timeout(Duration::from_secs(5), load_admin_dashboard(&service))
        .await
        .expect("fan-out must not wait for the stalled endpoints");

    match outcome {
        Err(ApiError::Status { status, .. }) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected the transactions failure, got {other:?}"),
    }
}

#[tokio::test]
async fn dashboard_loads_and_summarizes() {
    let server = MockServer::start().await;
    let no_delay = Duration::ZERO;
    mount_list(
        &server,
        "/api/players/",
        json!([{"id": 1, "membership_active": true}, {"id": 2}]),
        no_delay,
    )
    .await;
    mount_list(
        &server,
        "/api/teams/",
        json!([{"id": 3, "name": "Colts"}, {"id": 5, "captain": 1}]),
        no_delay,
    )
    .await;
    mount_list(&server, "/api/matches/", json!({"count": 0, "results": []}), no_delay).await;
    mount_list(
        &server,
        "/api/transactions/",
        json!([
            {"id": 1, "amount": "250.00", "paid": true},
            {"id": 2, "amount": "99.00", "paid": false}
        ]),
        no_delay,
    )
    .await;
    mount_list(&server, "/api/grounds/", json!([{"id": 4, "name": "Oval"}]), no_delay).await;

    let service = service_for(&server, logged_in_store());
    let dashboard = load_admin_dashboard(&service).await.unwrap();

    assert_eq!(dashboard.player_count, 2);
    assert_eq!(dashboard.active_members, 1);
    assert_eq!(dashboard.team_count, 2);
    assert_eq!(dashboard.team_names.get(&3).map(String::as_str), Some("Colts"));
    assert_eq!(dashboard.team_names.get(&5).map(String::as_str), Some("Team #5"));
    assert_eq!(dashboard.total_revenue, 250.0);
    assert_eq!(dashboard.pending_invoices.len(), 1);
    assert!(dashboard.upcoming_matches.is_empty());
    assert_eq!(dashboard.ground_names.get(&4).map(String::as_str), Some("Oval"));
}

#[tokio::test]
async fn player_lookups_map_names() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/api/players/",
        json!([{"id": 1, "first_name": "Asha", "last_name": "Rao"}, {"id": 2}]),
        Duration::ZERO,
    )
    .await;
    mount_list(&server, "/api/grounds/", json!([{"id": 9}]), Duration::ZERO).await;

    let service = service_for(&server, logged_in_store());
    let lookups = load_player_lookups(&service).await.unwrap();

    assert_eq!(lookups.players.len(), 2);
    assert_eq!(lookups.player_names[&1], "Asha Rao");
    assert_eq!(lookups.player_names[&2], "Player #2");
    assert_eq!(lookups.ground_names[&9], "Ground #9");
}

#[tokio::test]
async fn lineups_keep_only_fulfilled_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lineups/"))
        .and(query_param("match", "1"))
        .and(query_param("team", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 11, "match": 1, "team": 5, "players": [7, 8]},
            {"id": 12, "match": 1, "team": 5}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lineups/"))
        .and(query_param("match", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lineups/"))
        .and(query_param("match", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lineups/"))
        .and(query_param("match", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 14, "match": 4, "team": 5})))
        .mount(&server)
        .await;

    let service = service_for(&server, logged_in_store());
    let queries: Vec<LineupQuery> = (1..=4)
        .map(|match_id| LineupQuery { match_id, team: 5 })
        .collect();
    let lineups = load_lineups(&service, &queries).await;

    let ids: Vec<_> = lineups.iter().map(|l| l.lineup.id).collect();
    assert_eq!(ids, vec![Some(11), Some(14)]);
    assert_eq!(lineups[0].query, LineupQuery { match_id: 1, team: 5 });
}

#[tokio::test]
async fn player_transactions_are_filtered_by_stored_player() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/api/transactions/",
        json!([
            {"id": 1, "player": 7, "amount": "100", "paid": true},
            {"id": 2, "player": 7, "amount": "40", "paid": false},
            {"id": 3, "player": 8, "amount": "999", "paid": false}
        ]),
        Duration::ZERO,
    )
    .await;

    let store = logged_in_store();
    store.set(PLAYER_ID_KEY, "7").unwrap();
    let service = service_for(&server, store);
    let mine = load_player_transactions(&service).await.unwrap();

    assert_eq!(mine.player_id, Some(7));
    assert_eq!(mine.transactions.len(), 2);
    assert_eq!(mine.totals.paid, 100.0);
    assert_eq!(mine.totals.pending, 40.0);
}
