use crate::logger::types::{DecisionAction, DecisionLogEntry, DecisionLogSink};
use tracing::info;

pub struct ConsoleLogSink {
    json: bool,
}

impl ConsoleLogSink {
    pub fn new(format: &str) -> Self {
        Self {
            json: format == "json",
        }
    }
}

impl DecisionLogSink for ConsoleLogSink {
    fn log(&self, entry: &DecisionLogEntry) {
        if self.json {
            info!(
                target: "focus_decision",
                tab = entry.tab_id,
                url = %entry.url,
                host = ?entry.host,
                domain = ?entry.domain,
                action = ?entry.action,
                count = ?entry.count
            );
            return;
        }

        let target = entry
            .host
            .as_deref()
            .unwrap_or(entry.url.as_str());
        let action_str = match entry.action {
            DecisionAction::Intercepted => {
                let domain = entry.domain.as_deref().unwrap_or("unknown");
                match entry.count {
                    Some(count) => format!("intercepted ({} visit #{} today)", domain, count),
                    None => format!("intercepted ({})", domain),
                }
            }
            DecisionAction::Allowed => "user chose to continue".to_string(),
            DecisionAction::Declined => "user stayed focused".to_string(),
            DecisionAction::PassedThrough => "passed through".to_string(),
            DecisionAction::Ignored => "ignored".to_string(),
        };

        info!("[tab {}] {} -> {}", entry.tab_id, target, action_str);
    }
}
