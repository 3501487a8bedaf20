use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// livematch server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "livematch-server", version, about = "Live sports match service")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "LIVEMATCH_PORT", default_value = "8000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "LIVEMATCH_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./livematch.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "LIVEMATCH_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for the SQLite database
    #[arg(long, env = "LIVEMATCH_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Seconds between liveness probe sweeps over WebSocket connections
    #[arg(long, env = "LIVEMATCH_HEARTBEAT_INTERVAL_SECS", default_value = "30")]
    pub heartbeat_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            config: "./livematch.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            heartbeat_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (LIVEMATCH_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("LIVEMATCH_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# livematch Server Configuration
# Place this file at ./livematch.toml or specify with --config <path>
# All settings can be overridden via environment variables (LIVEMATCH_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 8000)
# port = 8000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database
# data_dir = "./data"

# Seconds between liveness probe sweeps over WebSocket connections.
# A viewer that misses two consecutive probes is disconnected.
# heartbeat_interval_secs = 30
"#
    .to_string()
}
