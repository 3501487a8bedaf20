//! Match lifecycle derivation from wall-clock time.
//!
//! A match's status is a pure function of (now, start_time, end_time); the
//! stored column is only a cache of that function. `sync_match_status`
//! reconciles the cache against the freshly derived value.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::MatchRow;

/// Lifecycle state of a match. Transitions are strictly monotonic:
/// scheduled → live → finished, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "live" => Some(Self::Live),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Derive the status for `now`. The end boundary is inclusive-finished:
/// a match whose end time equals `now` is already finished.
///
/// Returns None when either timestamp fails to parse (indeterminate) —
/// the caller keeps whatever status is stored rather than guessing.
pub fn resolve_status(start: &str, end: &str, now: DateTime<Utc>) -> Option<MatchStatus> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;

    Some(if now < start {
        MatchStatus::Scheduled
    } else if now >= end {
        MatchStatus::Finished
    } else {
        MatchStatus::Live
    })
}

/// Reconcile a stored status against the one derived for `now`.
///
/// On divergence the persistence callback runs first and the in-memory
/// field is updated only after it succeeds, so a failed write leaves the
/// row untouched and the error reaches the caller verbatim. Indeterminate
/// timestamps leave everything as-is and never invoke the callback.
/// Single-writer discipline per match is the caller's responsibility.
pub async fn sync_match_status<F, Fut, E>(
    m: &mut MatchRow,
    now: DateTime<Utc>,
    update: F,
) -> Result<MatchStatus, E>
where
    F: FnOnce(MatchStatus) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let Some(next) = resolve_status(&m.start_time, &m.end_time, now) else {
        return Ok(m.status);
    };

    if next != m.status {
        update(next).await?;
        m.status = next;
    }

    Ok(m.status)
}
