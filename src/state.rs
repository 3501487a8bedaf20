use std::sync::Arc;

use crate::db::DbPool;
use crate::ws::server::NotificationServer;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// Push channel: connection registry, liveness monitor, broadcaster
    pub notifier: Arc<NotificationServer>,
}
