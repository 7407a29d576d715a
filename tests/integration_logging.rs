use focus_gate::config::LoggingConfig;
use focus_gate::logger::memory_sink::recent;
use focus_gate::logger::{
    DecisionAction, DecisionLogEntry, DecisionLogSink, DecisionLogger, MemoryLogSink,
};
use std::time::Duration;

#[tokio::test]
async fn test_decision_logger_fans_out_to_memory_sink() {
    let config = LoggingConfig {
        enable: true,
        log_intercepts: true,
        log_all_navigations: false,
        format: "text".to_string(),
        level: "info".to_string(),
        decision_log_sinks: vec!["console".to_string(), "memory".to_string()],
        memory_capacity: 10,
    };

    let sink = MemoryLogSink::new(10);
    let buffer = sink.clone_buffer();
    let sinks: Vec<Box<dyn DecisionLogSink>> = vec![Box::new(sink)];
    let logger = DecisionLogger::new(config, sinks);

    let mut entry = DecisionLogEntry::new(7, "https://sub.reddit.com/", DecisionAction::Intercepted);
    entry.host = Some("sub.reddit.com".to_string());
    entry.domain = Some("reddit.com".to_string());
    entry.count = Some(1);
    logger.log(entry);

    // Filtered out: plain navigation logging is off
    logger.log(DecisionLogEntry::new(7, "https://docs.rs/", DecisionAction::Ignored));

    // Allow time for async task to process
    tokio::time::sleep(Duration::from_millis(100)).await;

    let entries = recent(&buffer, 10);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, DecisionAction::Intercepted);
    assert_eq!(entries[0].domain.as_deref(), Some("reddit.com"));
    assert_eq!(entries[0].count, Some(1));
}
