pub mod console_sink;
pub mod memory_sink;
pub mod types;

pub use self::console_sink::ConsoleLogSink;
pub use self::memory_sink::{LogBuffer, MemoryLogSink};
pub use self::types::{DecisionAction, DecisionLogEntry, DecisionLogSink};

use crate::config::LoggingConfig;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Fans decision records out to the configured sinks, each on its own task.
pub struct DecisionLogger {
    config: LoggingConfig,
    sinks: Vec<mpsc::Sender<DecisionLogEntry>>,
}

impl DecisionLogger {
    /// Must be called from within a Tokio runtime. `extra_sinks` are added
    /// after the ones named in `config.decision_log_sinks`.
    pub fn new(config: LoggingConfig, extra_sinks: Vec<Box<dyn DecisionLogSink>>) -> Arc<Self> {
        let mut all_sinks: Vec<Box<dyn DecisionLogSink>> = Vec::new();

        for sink_type in &config.decision_log_sinks {
            match sink_type.as_str() {
                "console" => all_sinks.push(Box::new(ConsoleLogSink::new(&config.format))),
                // Built by the caller, which keeps the buffer handle.
                "memory" => {}
                other => warn!("Unknown decision log sink type: {}", other),
            }
        }
        all_sinks.extend(extra_sinks);

        let mut sinks = Vec::new();
        for sink in all_sinks {
            let (tx, mut rx) = mpsc::channel::<DecisionLogEntry>(1000);
            tokio::spawn(async move {
                while let Some(entry) = rx.recv().await {
                    sink.log(&entry);
                }
            });
            sinks.push(tx);
        }

        Arc::new(Self { config, sinks })
    }

    pub fn should_log(&self, action: DecisionAction) -> bool {
        if !self.config.enable {
            return false;
        }
        if action.is_gate_event() {
            self.config.log_intercepts
        } else {
            self.config.log_all_navigations
        }
    }

    pub fn log(&self, entry: DecisionLogEntry) {
        if !self.should_log(entry.action) {
            return;
        }
        // Fire and forget, a full sink drops the entry instead of stalling navigation
        for sink in &self.sinks {
            let _ = sink.try_send(entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filters_plain_navigation_by_default() {
        let logger = DecisionLogger::new(LoggingConfig::default(), vec![]);
        assert!(logger.should_log(DecisionAction::Intercepted));
        assert!(logger.should_log(DecisionAction::Declined));
        assert!(!logger.should_log(DecisionAction::Ignored));
        assert!(!logger.should_log(DecisionAction::PassedThrough));
    }

    #[tokio::test]
    async fn test_disabled_logging_drops_everything() {
        let config = LoggingConfig {
            enable: false,
            ..LoggingConfig::default()
        };
        let logger = DecisionLogger::new(config, vec![]);
        assert!(!logger.should_log(DecisionAction::Intercepted));
    }
}
