//! Heartbeat-based dead peer detection.
//!
//! A single periodic task sweeps the whole registry. Each sweep probes every
//! connection with a WebSocket ping and evicts any connection whose alive
//! flag was never reset by a pong since the previous sweep. A peer that
//! misses two consecutive sweeps is therefore gone, which bounds resource
//! use under connection churn.

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::ws::registry::{ConnectionRegistry, ReadyState};

/// Handle to the periodic probe/evict task.
pub struct LivenessMonitor {
    cancel: CancellationToken,
}

impl LivenessMonitor {
    /// Spawn the sweep task with the given probe period.
    pub fn spawn(registry: ConnectionRegistry, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        tokio::spawn(run(registry, period, cancel.clone()));
        Self { cancel }
    }

    /// Cancel the periodic task. After this no further sweep touches the
    /// registry; required at server shutdown so the timer does not leak.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(registry: ConnectionRegistry, period: Duration, cancel: CancellationToken) {
    let mut timer = interval(period);
    // Skip the first immediate tick
    timer.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => sweep(&registry),
        }
    }

    tracing::debug!("liveness monitor stopped");
}

/// One probe/evict pass over the registry.
///
/// Connections that failed to pong since the previous pass are terminated
/// and unregistered; everyone else has their alive flag cleared and gets a
/// fresh ping. Termination is best-effort and never raises.
pub(crate) fn sweep(registry: &ConnectionRegistry) {
    registry.for_each(|id, entry| {
        if !entry.is_alive() {
            tracing::info!(connection_id = %id, "no pong since last probe, evicting connection");
            entry.set_ready_state(ReadyState::Closing);
            entry.kill_token().cancel();
            registry.unregister(id);
            return;
        }

        entry.set_alive(false);
        if !entry.send(Message::Ping(Vec::new().into())) {
            // Writer task already gone; reap the stale entry now.
            registry.unregister(id);
        }
    });
}
