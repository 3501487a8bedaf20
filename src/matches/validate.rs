//! Request validation for the match CRUD endpoints.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

/// Raw create payload as received over the wire (camelCase JSON).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
}

/// A create request that passed validation. Timestamps are normalized to
/// UTC RFC 3339 so stored values compare lexicographically in time order.
#[derive(Debug)]
pub struct NewMatch {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: String,
    pub end_time: String,
    pub home_score: i64,
    pub away_score: i64,
}

fn normalize(dt: DateTime<chrono::FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Validate a create request: non-empty strings, RFC 3339 timestamps with
/// offset, non-negative scores, and start strictly before end (the storage
/// layer enforces the same with a CHECK constraint).
pub fn validate_create(req: CreateMatchRequest) -> Result<NewMatch, &'static str> {
    let sport = req.sport.trim().to_string();
    let home_team = req.home_team.trim().to_string();
    let away_team = req.away_team.trim().to_string();
    if sport.is_empty() || home_team.is_empty() || away_team.is_empty() {
        return Err("sport and team names must be non-empty");
    }

    let start = DateTime::parse_from_rfc3339(&req.start_time)
        .map_err(|_| "startTime is not a valid RFC 3339 timestamp")?;
    let end = DateTime::parse_from_rfc3339(&req.end_time)
        .map_err(|_| "endTime is not a valid RFC 3339 timestamp")?;
    if start >= end {
        return Err("startTime must be before endTime");
    }

    let home_score = req.home_score.unwrap_or(0);
    let away_score = req.away_score.unwrap_or(0);
    if home_score < 0 || away_score < 0 {
        return Err("scores must be non-negative");
    }

    Ok(NewMatch {
        sport,
        home_team,
        away_team,
        start_time: normalize(start),
        end_time: normalize(end),
        home_score,
        away_score,
    })
}

/// Upper bound on the list page size.
pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_LIMIT: i64 = 50;

/// Clamp-check a requested list limit.
pub fn validate_limit(limit: Option<i64>) -> Result<i64, &'static str> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err("limit must be between 1 and 100")
    }
}
