//! Fan-out of one notification to every eligible connection.

use axum::extract::ws::Message;
use serde::Serialize;

use crate::ws::registry::{ConnectionEntry, ConnectionRegistry, ReadyState};

/// Serialize `payload` exactly once and deliver the bytes to every
/// connection in the OPEN state. Connections in any other state are skipped
/// silently, and one failed send never aborts delivery to the rest.
/// Fire-and-forget: no acknowledgment, no retry, no ordering guarantee.
pub fn broadcast_to_all<T: Serialize>(registry: &ConnectionRegistry, payload: &T) {
    let text = match serde_json::to_string(payload) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize broadcast payload");
            return;
        }
    };
    let msg = Message::Text(text.into());

    registry.for_each(|_id, entry| {
        if entry.ready_state() != ReadyState::Open {
            return;
        }
        // A dead receiver is reaped by the next liveness sweep.
        let _ = entry.send(msg.clone());
    });
}

/// Send a JSON payload to a single connection, if it is open.
pub fn send_json<T: Serialize>(entry: &ConnectionEntry, payload: &T) {
    if entry.ready_state() != ReadyState::Open {
        return;
    }
    match serde_json::to_string(payload) {
        Ok(text) => {
            let _ = entry.send(Message::Text(text.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize message payload");
        }
    }
}
