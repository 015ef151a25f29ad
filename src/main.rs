use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use sharebox::{Config, Database, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = sharebox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        sharebox::logging::init_console_only(&config.logging.level);
    }

    info!("Sharebox {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = match WebServer::new(&config, db.clone()) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create web server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server configured on {}", server.addr());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutting down");
    };

    let result = server.run(shutdown).await;
    db.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Web server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
