//! Integration tests for match CRUD, payload validation, and status
//! reconciliation at read time.

use rusqlite::params;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use livematch_server::db::DbPool;
use livematch_server::state::AppState;
use livematch_server::ws::server::NotificationServer;

/// Helper: start the server on a random port and return the shared DB handle
/// for direct row setup/inspection.
async fn start_test_server() -> (SocketAddr, DbPool, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = livematch_server::db::init_db(&data_dir).expect("Failed to init DB");
    let notifier = Arc::new(NotificationServer::new(Duration::from_secs(30)));

    let state = AppState {
        db: db.clone(),
        notifier,
    };

    let app = livematch_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, db, tmp_dir)
}

fn match_body(home_team: &str, start_offset_mins: i64, end_offset_mins: i64) -> serde_json::Value {
    let start = chrono::Utc::now() + chrono::Duration::minutes(start_offset_mins);
    let end = chrono::Utc::now() + chrono::Duration::minutes(end_offset_mins);
    json!({
        "sport": "football",
        "homeTeam": home_team,
        "awayTeam": "Visitors",
        "startTime": start.to_rfc3339(),
        "endTime": end.to_rfc3339(),
    })
}

/// Insert a row directly, bypassing the API, and return its id.
fn insert_match(db: &DbPool, status: &str, start: &str, end: &str) -> i64 {
    let conn = db.lock().unwrap();
    conn.execute(
        "INSERT INTO matches \
         (sport, home_team, away_team, status, start_time, end_time, home_score, away_score, created_at) \
         VALUES ('football', 'Home', 'Away', ?1, ?2, ?3, 0, 0, ?4)",
        params![status, start, end, "2024-01-01T00:00:00Z"],
    )
    .expect("Failed to insert match");
    conn.last_insert_rowid()
}

fn stored_status(db: &DbPool, id: i64) -> String {
    let conn = db.lock().unwrap();
    conn.query_row(
        "SELECT status FROM matches WHERE id = ?1",
        [id],
        |row| row.get(0),
    )
    .expect("Failed to read status")
}

#[tokio::test]
async fn test_create_match_returns_created_row() {
    let (addr, _db, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/matches", addr))
        .json(&match_body("Arsenal", 60, 180))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert!(data["id"].as_i64().unwrap() >= 1);
    assert_eq!(data["homeTeam"], "Arsenal");
    assert_eq!(data["status"], "scheduled");
    assert_eq!(data["homeScore"], 0);
    // Timestamps come back normalized to UTC.
    assert!(data["startTime"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_create_match_in_progress_is_live() {
    let (addr, _db, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/matches", addr))
        .json(&match_body("Arsenal", -10, 80))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "live");
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let (addr, _db, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let mut missing_sport = match_body("Arsenal", 60, 180);
    missing_sport.as_object_mut().unwrap().remove("sport");

    let mut bad_timestamp = match_body("Arsenal", 60, 180);
    bad_timestamp["startTime"] = json!("tomorrow at noon");

    let start_after_end = match_body("Arsenal", 180, 60);

    let mut negative_score = match_body("Arsenal", 60, 180);
    negative_score["homeScore"] = json!(-3);

    for body in [
        &missing_sport,
        &bad_timestamp,
        &start_after_end,
        &negative_score,
    ] {
        let resp = client
            .post(format!("http://{}/matches", addr))
            .json(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "Payload should be rejected: {body}");
        let err: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(err["error"], "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn test_list_orders_newest_first_and_respects_limit() {
    let (addr, _db, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    for name in ["First", "Second", "Third"] {
        let resp = client
            .post(format!("http://{}/matches", addr))
            .json(&match_body(name, 60, 180))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let body: serde_json::Value = client
        .get(format!("http://{}/matches", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["homeTeam"], "Third");
    assert_eq!(data[2]["homeTeam"], "First");

    let body: serde_json::Value = client
        .get(format!("http://{}/matches?limit=2", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    for bad in ["0", "101", "-5"] {
        let resp = client
            .get(format!("http://{}/matches?limit={}", addr, bad))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "limit={} should be rejected", bad);
    }
}

#[tokio::test]
async fn test_get_match_reconciles_and_persists_status() {
    let (addr, db, _tmp) = start_test_server().await;

    // Stored as scheduled, but both timestamps are long past.
    let id = insert_match(
        &db,
        "scheduled",
        "2024-01-15T10:00:00Z",
        "2024-01-15T12:00:00Z",
    );

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .get(format!("http://{}/matches/{}", addr, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["status"], "finished");

    // The correction was written through, not just computed for display.
    assert_eq!(stored_status(&db, id), "finished");
}

#[tokio::test]
async fn test_get_match_with_garbage_timestamps_serves_stored_status() {
    let (addr, db, _tmp) = start_test_server().await;

    // Unparseable timestamps: indeterminate, so the stored status stands.
    let id = insert_match(&db, "scheduled", "not-a-date", "zzz");

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .get(format!("http://{}/matches/{}", addr, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["status"], "scheduled");
    assert_eq!(stored_status(&db, id), "scheduled");
}

#[tokio::test]
async fn test_get_unknown_match_is_404() {
    let (addr, _db, _tmp) = start_test_server().await;

    let resp = reqwest::Client::new()
        .get(format!("http://{}/matches/999999", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_health_check() {
    let (addr, _db, _tmp) = start_test_server().await;

    let resp = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}
