//! Initialization helpers for the application startup.

use crate::config::{Config, StorageBackend};
use crate::logger::{DecisionLogSink, DecisionLogger, LogBuffer, MemoryLogSink};
use crate::store::{MemoryStore, SqliteStore, StateStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Keep the HTTP stack quiet unless explicitly enabled
        if !filter.contains("hyper") {
            filter.push_str(",hyper=warn");
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

/// Opens the configured state store.
pub fn init_store(config: &Config) -> Result<Arc<dyn StateStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(config.storage.sqlite_path.clone()).with_context(|| {
                format!(
                    "Failed to open SQLite state store at {}",
                    config.storage.sqlite_path
                )
            })?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using in-memory state store; settings and counters reset on restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Builds the decision logger.
///
/// Returns the logger and, when the "memory" sink is configured, the buffer
/// the API reads recent decisions from.
pub fn init_decision_logger(config: &Config) -> (Arc<DecisionLogger>, Option<LogBuffer>) {
    let use_memory_sink = config
        .logging
        .decision_log_sinks
        .iter()
        .any(|s| s == "memory");

    let mut extra_sinks: Vec<Box<dyn DecisionLogSink>> = Vec::new();
    let mut buffer = None;
    if use_memory_sink {
        let sink = MemoryLogSink::new(config.logging.memory_capacity);
        buffer = Some(sink.clone_buffer());
        extra_sinks.push(Box::new(sink));
    }

    (
        DecisionLogger::new(config.logging.clone(), extra_sinks),
        buffer,
    )
}
