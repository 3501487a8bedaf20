pub mod actor;
pub mod broadcast;
pub mod handler;
pub mod liveness;
pub mod protocol;
pub mod registry;
pub mod server;

use tokio::sync::mpsc;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push frames to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
