//! Database row types. These correspond 1:1 to the SQLite schema defined in
//! migrations.rs and double as the camelCase JSON wire shape.

use serde::{Deserialize, Serialize};

use crate::matches::status::MatchStatus;

/// Match record in the matches table. Timestamps are RFC 3339 strings
/// normalized to UTC, so lexical ordering matches chronological ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRow {
    pub id: i64,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub status: MatchStatus,
    pub start_time: String,
    pub end_time: String,
    pub home_score: i64,
    pub away_score: i64,
    pub created_at: String,
}

impl MatchRow {
    /// Map a row from `SELECT id, sport, home_team, away_team, status,
    /// start_time, end_time, home_score, away_score, created_at`.
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let status_raw: String = row.get(4)?;
        let status = MatchStatus::from_str(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown match status: {status_raw}").into(),
            )
        })?;
        Ok(Self {
            id: row.get(0)?,
            sport: row.get(1)?,
            home_team: row.get(2)?,
            away_team: row.get(3)?,
            status,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            home_score: row.get(7)?,
            away_score: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
