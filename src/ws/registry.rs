//! In-memory bookkeeping for open WebSocket connections.
//!
//! The registry is pure state: no I/O policy lives here. The liveness
//! monitor and the broadcaster both walk it, and the per-connection actor
//! registers/unregisters around its own lifetime.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::ws::ConnectionSender;

/// Transport lifecycle phase of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Process-unique identifier for one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocate the next connection id from a process-wide counter.
pub fn next_connection_id() -> ConnectionId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
}

/// Per-connection state tracked by the registry.
pub struct ConnectionEntry {
    sender: ConnectionSender,
    ready_state: AtomicU8,
    /// Heartbeat flag: cleared by the liveness sweep before each probe,
    /// set again by the actor when a pong arrives and on registration.
    alive: AtomicBool,
    /// Cancelled to force-terminate the connection actor.
    kill: CancellationToken,
}

impl ConnectionEntry {
    pub fn new(sender: ConnectionSender) -> Self {
        Self {
            sender,
            ready_state: AtomicU8::new(ReadyState::Connecting as u8),
            alive: AtomicBool::new(true),
            kill: CancellationToken::new(),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready_state.load(Ordering::Acquire))
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.store(state as u8, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    /// Queue a frame for this connection's writer task.
    /// Returns false when the writer is gone (connection torn down).
    pub fn send(&self, msg: Message) -> bool {
        self.sender.send(msg).is_ok()
    }

    pub fn kill_token(&self) -> &CancellationToken {
        &self.kill
    }
}

/// Connection registry: tracks all currently-open viewer connections.
///
/// Cheap to clone; all clones share the same underlying map.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<ConnectionId, Arc<ConnectionEntry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Idempotent: re-registering an already-present id
    /// keeps the existing entry. The alive flag is (re)set either way.
    pub fn register(&self, id: ConnectionId, entry: Arc<ConnectionEntry>) {
        let entry = self.inner.entry(id).or_insert(entry);
        entry.set_alive(true);
        drop(entry);
        tracing::debug!(connection_id = %id, connections = self.len(), "connection registered");
    }

    /// Remove a connection. No-op when the id is already absent.
    pub fn unregister(&self, id: ConnectionId) {
        if self.inner.remove(&id).is_some() {
            tracing::debug!(connection_id = %id, connections = self.len(), "connection unregistered");
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Visit every registered connection over a snapshot copy, so `f` may
    /// unregister entries mid-walk without skipping or double-visiting the rest.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(ConnectionId, &Arc<ConnectionEntry>),
    {
        let snapshot: Vec<(ConnectionId, Arc<ConnectionEntry>)> = self
            .inner
            .iter()
            .map(|kv| (*kv.key(), kv.value().clone()))
            .collect();
        for (id, entry) in &snapshot {
            f(*id, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_entry() -> Arc<ConnectionEntry> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(ConnectionEntry::new(tx))
    }

    #[test]
    fn register_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let id = next_connection_id();
        let entry = test_entry();

        registry.register(id, entry.clone());
        registry.register(id, test_entry());

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_resets_alive_flag() {
        let registry = ConnectionRegistry::new();
        let id = next_connection_id();
        let entry = test_entry();

        registry.register(id, entry.clone());
        entry.set_alive(false);
        registry.register(id, entry.clone());

        assert!(entry.is_alive());
    }

    #[test]
    fn unregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.unregister(next_connection_id());
        assert!(registry.is_empty());
    }

    #[test]
    fn for_each_tolerates_removal_mid_walk() {
        let registry = ConnectionRegistry::new();
        let ids: Vec<ConnectionId> = (0..3).map(|_| next_connection_id()).collect();
        for id in &ids {
            registry.register(*id, test_entry());
        }

        // Remove a different member from inside the walk; every original
        // member must still be visited exactly once.
        let mut visited = Vec::new();
        registry.for_each(|id, _entry| {
            if visited.is_empty() {
                let other = ids.iter().find(|i| **i != id).unwrap();
                registry.unregister(*other);
            }
            visited.push(id);
        });

        assert_eq!(visited.len(), 3);
        for id in &ids {
            assert_eq!(visited.iter().filter(|v| *v == id).count(), 1);
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ready_state_round_trips() {
        let entry = test_entry();
        assert_eq!(entry.ready_state(), ReadyState::Connecting);
        entry.set_ready_state(ReadyState::Open);
        assert_eq!(entry.ready_state(), ReadyState::Open);
        entry.set_ready_state(ReadyState::Closing);
        assert_eq!(entry.ready_state(), ReadyState::Closing);
        entry.set_ready_state(ReadyState::Closed);
        assert_eq!(entry.ready_state(), ReadyState::Closed);
    }
}
