use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use focus_gate::api::{start_api_server, ApiState};
use focus_gate::config::Config;
use focus_gate::counters::{DailyCounterService, SystemClock};
use focus_gate::engine::{CommandQueue, EngineOptions, NavigationEngine};
use focus_gate::init::{init_decision_logger, init_store, setup_logging};
use focus_gate::settings::SettingsService;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "focus-gate.toml".to_string());
    let config_exists = std::path::Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting focus-gate...");
    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Init Store
    let store = init_store(&config)?;

    // 4. Init Decision Logger
    let (logger, logs_buffer) = init_decision_logger(&config);

    // 5. Build Engine
    let commands = CommandQueue::new(config.command_queue_capacity);
    let clock = Arc::new(SystemClock::new(config.counters.day_boundary));
    let counters = Arc::new(DailyCounterService::new(store.clone(), clock));
    let engine = Arc::new(
        NavigationEngine::new(
            store.clone(),
            Arc::new(commands.clone()),
            counters,
            EngineOptions::from_config(&config),
        )
        .with_logger(logger),
    );

    // 6. Seed defaults (idempotent) and restore the badge
    engine.on_installed().await;

    // 7. Start API Server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid listen address")?;
    let state = Arc::new(ApiState {
        engine,
        settings: Arc::new(SettingsService::new(store)),
        commands,
        logs: logs_buffer,
        config,
    });

    // 8. Graceful Shutdown
    tokio::select! {
        result = start_api_server(state, addr) => result?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
