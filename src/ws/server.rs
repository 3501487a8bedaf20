//! Lifecycle glue for the push channel: owns the connection registry and the
//! liveness monitor, and exposes the one outward-facing broadcast operation.

use std::time::Duration;

use crate::db::models::MatchRow;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::liveness::LivenessMonitor;
use crate::ws::protocol::ServerMessage;
use crate::ws::registry::ConnectionRegistry;

pub struct NotificationServer {
    registry: ConnectionRegistry,
    monitor: LivenessMonitor,
}

impl NotificationServer {
    /// Create the registry and start the liveness monitor with the given
    /// heartbeat period.
    pub fn new(heartbeat: Duration) -> Self {
        let registry = ConnectionRegistry::new();
        let monitor = LivenessMonitor::spawn(registry.clone(), heartbeat);
        Self { registry, monitor }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Fan a `match_created` notification out to every open viewer
    /// connection. Called by the REST layer after a successful insert.
    pub fn broadcast_match_created(&self, created: MatchRow) {
        tracing::debug!(match_id = created.id, "broadcasting match_created");
        broadcast_to_all(&self.registry, &ServerMessage::MatchCreated { data: created });
    }

    /// Stop the liveness monitor. Called at server shutdown so the periodic
    /// task does not outlive the listener.
    pub fn shutdown(&self) {
        self.monitor.stop();
    }
}
