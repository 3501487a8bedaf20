//! WebSocket upgrade endpoint.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// Upper bound on a single inbound message. Anything larger errors the read
/// and closes the connection instead of buffering.
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// GET /ws — upgrade to a WebSocket and hand the socket to the connection actor.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let notifier = state.notifier.clone();
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .max_frame_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| actor::run_connection(socket, notifier))
}
