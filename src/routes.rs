use axum::{routing::get, Router};

use crate::matches::routes as match_routes;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    let match_routes = Router::new()
        .route(
            "/matches",
            get(match_routes::list_matches).post(match_routes::create_match),
        )
        .route("/matches/{id}", get(match_routes::get_match));

    // WebSocket push channel shares the listener with the REST API.
    let ws_routes = Router::new().route("/ws", get(ws_handler::ws_upgrade));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(match_routes)
        .merge(ws_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
