//! Actor-per-connection lifecycle for an accepted WebSocket.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::ws::broadcast;
use crate::ws::protocol::ServerMessage;
use crate::ws::registry::{next_connection_id, ConnectionEntry, ReadyState};
use crate::ws::server::NotificationServer;

/// Run one viewer connection to completion.
///
/// Splits the socket into reader and writer halves. The writer task owns the
/// sink and forwards frames from an mpsc channel, so the registry (and
/// anything holding a `ConnectionSender`) can push to this client. The
/// reader loop handles pong bookkeeping and close/error teardown; inbound
/// application frames are ignored — this is a push-only channel.
pub async fn run_connection(socket: WebSocket, notifier: Arc<NotificationServer>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let id = next_connection_id();
    let entry = Arc::new(ConnectionEntry::new(tx.clone()));
    let kill = entry.kill_token().clone();

    let registry = notifier.registry().clone();
    registry.register(id, entry.clone());
    entry.set_ready_state(ReadyState::Open);

    // One-time greeting for this connection only.
    broadcast::send_json(&entry, &ServerMessage::Welcome);

    tracing::info!(connection_id = %id, "WebSocket connection opened");

    // Writer task: forwards mpsc frames to the WebSocket sink.
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    loop {
        tokio::select! {
            // Evicted by the liveness monitor: close out best-effort.
            _ = kill.cancelled() => {
                entry.set_ready_state(ReadyState::Closing);
                let _ = tx.send(Message::Close(Some(CloseFrame {
                    code: 1001,
                    reason: "liveness timeout".into(),
                })));
                break;
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(msg)) => match msg {
                    Message::Pong(_) => {
                        entry.set_alive(true);
                    }
                    Message::Ping(data) => {
                        let _ = tx.send(Message::Pong(data));
                    }
                    Message::Close(frame) => {
                        entry.set_ready_state(ReadyState::Closing);
                        tracing::info!(connection_id = %id, reason = ?frame, "client initiated close");
                        break;
                    }
                    Message::Text(_) | Message::Binary(_) => {
                        tracing::debug!(connection_id = %id, "ignoring inbound client frame");
                    }
                },
                Some(Err(e)) => {
                    // Transport error, including frames over the size cap.
                    tracing::warn!(connection_id = %id, error = %e, "WebSocket receive error");
                    break;
                }
                None => {
                    tracing::info!(connection_id = %id, "WebSocket stream ended");
                    break;
                }
            }
        }
    }

    entry.set_ready_state(ReadyState::Closed);
    registry.unregister(id);

    // Dropping the remaining senders closes the channel; the detached writer
    // drains any queued frames (including a close) and then exits on its own.
    drop(tx);
    drop(entry);
    drop(writer_handle);

    tracing::info!(connection_id = %id, "WebSocket connection closed");
}

/// Writer task: receives frames from the mpsc channel and forwards them to
/// the WebSocket sink until the channel closes or a send fails.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken.
            break;
        }
    }
}
