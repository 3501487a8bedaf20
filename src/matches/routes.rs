//! REST handlers for match CRUD. After a successful create the new match is
//! fanned out to every connected viewer via the notification server.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::models::MatchRow;
use crate::db::DbPool;
use crate::matches::status::{resolve_status, sync_match_status, MatchStatus};
use crate::matches::validate::{validate_create, validate_limit, CreateMatchRequest};
use crate::state::AppState;

const SELECT_COLUMNS: &str =
    "id, sport, home_team, away_team, status, start_time, end_time, home_score, away_score, created_at";

type DbError = Box<dyn std::error::Error + Send + Sync>;
type ErrorResponse = (StatusCode, Json<serde_json::Value>);

// --- Response types ---

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub data: Vec<MatchRow>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub data: MatchRow,
}

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct ListMatchesQuery {
    pub limit: Option<i64>,
}

// --- Error helpers ---

fn invalid_request() -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "INVALID_REQUEST" })),
    )
}

fn server_error(message: &str) -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
}

/// Persist a corrected status for one match. Used as the update callback
/// for `sync_match_status` on the read paths.
async fn persist_status(db: DbPool, id: i64, next: MatchStatus) -> Result<(), DbError> {
    tokio::task::spawn_blocking(move || -> Result<(), DbError> {
        let conn = db.lock().map_err(|_| "db lock poisoned")?;
        conn.execute(
            "UPDATE matches SET status = ?1 WHERE id = ?2",
            params![next.as_str(), id],
        )?;
        Ok(())
    })
    .await?
}

// --- Handlers ---

/// GET /matches — list matches, newest first.
/// Each returned row has its status reconciled against the clock; a failed
/// status write is logged and the stored status served as-is.
pub async fn list_matches(
    State(state): State<AppState>,
    Query(query): Query<ListMatchesQuery>,
) -> Result<Json<MatchListResponse>, ErrorResponse> {
    let limit = validate_limit(query.limit).map_err(|_| invalid_request())?;

    let db = state.db.clone();
    let mut rows = tokio::task::spawn_blocking(move || -> Result<Vec<MatchRow>, DbError> {
        let conn = db.lock().map_err(|_| "db lock poisoned")?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM matches ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map([limit], MatchRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "list matches task failed");
        server_error("Failed to list match")
    })?
    .map_err(|e| {
        tracing::error!(error = %e, "failed to list matches");
        server_error("Failed to list match")
    })?;

    let now = Utc::now();
    for row in rows.iter_mut() {
        let db = state.db.clone();
        let id = row.id;
        if let Err(e) = sync_match_status(row, now, |next| persist_status(db, id, next)).await {
            tracing::warn!(match_id = id, error = %e, "failed to persist status correction");
        }
    }

    Ok(Json(MatchListResponse { data: rows }))
}

/// GET /matches/{id} — fetch one match with its status reconciled.
/// Unlike the list path, a failed status write here surfaces as a 500.
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchResponse>, ErrorResponse> {
    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || -> Result<Option<MatchRow>, DbError> {
        let conn = db.lock().map_err(|_| "db lock poisoned")?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM matches WHERE id = ?1"),
                [id],
                MatchRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "get match task failed");
        server_error("Failed to get match")
    })?
    .map_err(|e| {
        tracing::error!(match_id = id, error = %e, "failed to get match");
        server_error("Failed to get match")
    })?;

    let Some(mut row) = row else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "NOT_FOUND" })),
        ));
    };

    let db = state.db.clone();
    sync_match_status(&mut row, Utc::now(), |next| persist_status(db, id, next))
        .await
        .map_err(|e| {
            tracing::error!(match_id = id, error = %e, "failed to persist status correction");
            server_error("Failed to sync match status")
        })?;

    Ok(Json(MatchResponse { data: row }))
}

/// POST /matches — validate, insert, broadcast, 201.
pub async fn create_match(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<MatchResponse>), ErrorResponse> {
    let req: CreateMatchRequest = serde_json::from_value(body).map_err(|_| invalid_request())?;
    let new = validate_create(req).map_err(|reason| {
        tracing::debug!(reason, "rejected create match request");
        invalid_request()
    })?;

    let now = Utc::now();
    // Timestamps were just validated, so derivation cannot be indeterminate.
    let status = resolve_status(&new.start_time, &new.end_time, now)
        .unwrap_or(MatchStatus::Scheduled);
    let created_at = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let db = state.db.clone();
    let row = tokio::task::spawn_blocking(move || -> Result<MatchRow, DbError> {
        let conn = db.lock().map_err(|_| "db lock poisoned")?;
        let row = conn.query_row(
            &format!(
                "INSERT INTO matches \
                 (sport, home_team, away_team, status, start_time, end_time, home_score, away_score, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 RETURNING {SELECT_COLUMNS}"
            ),
            params![
                new.sport,
                new.home_team,
                new.away_team,
                status.as_str(),
                new.start_time,
                new.end_time,
                new.home_score,
                new.away_score,
                created_at,
            ],
            MatchRow::from_row,
        )?;
        Ok(row)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create match task failed");
        server_error("Failed to create a match")
    })?
    .map_err(|e| {
        tracing::error!(error = %e, "failed to create match");
        server_error("Failed to create a match")
    })?;

    state.notifier.broadcast_match_created(row.clone());

    Ok((StatusCode::CREATED, Json(MatchResponse { data: row })))
}
