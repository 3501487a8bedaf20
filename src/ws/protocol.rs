//! Wire shapes for server→client push frames.
//!
//! All frames are UTF-8 JSON text, tagged by a `type` field:
//! `{"type":"welcome"}` once per new connection, and
//! `{"type":"match_created","data":<Match>}` fanned out on every create.

use serde::Serialize;

use crate::db::models::MatchRow;

/// Server→client messages pushed over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One-time greeting sent to a connection right after registration.
    Welcome,
    /// A match was created by the REST layer.
    MatchCreated { data: MatchRow },
}
