mod config;
mod db;
mod matches;
mod routes;
mod state;
mod ws;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use config::{generate_config_template, Config};
use ws::server::NotificationServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "livematch_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "livematch_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("livematch-server v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // Push channel: registry + liveness monitor + broadcaster
    let notifier = Arc::new(NotificationServer::new(Duration::from_secs(
        config.heartbeat_interval_secs,
    )));

    let app_state = state::AppState {
        db,
        notifier: notifier.clone(),
    };

    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("WebSocket endpoint at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cancel the periodic liveness task so nothing outlives the listener.
    notifier.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
