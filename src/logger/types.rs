use crate::engine::TabId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub tab_id: TabId,
    pub url: String,
    pub host: Option<String>,
    pub domain: Option<String>, // Matched blocked entry
    pub action: DecisionAction,
    pub count: Option<u64>, // Today's count after an intercept
}

impl DecisionLogEntry {
    pub fn new(tab_id: TabId, url: impl Into<String>, action: DecisionAction) -> Self {
        Self {
            timestamp: Utc::now(),
            tab_id,
            url: url.into(),
            host: None,
            domain: None,
            action,
            count: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum DecisionAction {
    Ignored,
    PassedThrough,
    Intercepted,
    Allowed,
    Declined,
}

impl DecisionAction {
    /// Whether the entry records a user-facing gate event rather than plain traffic.
    pub fn is_gate_event(&self) -> bool {
        matches!(
            self,
            DecisionAction::Intercepted | DecisionAction::Allowed | DecisionAction::Declined
        )
    }
}

pub trait DecisionLogSink: Send + Sync {
    fn log(&self, entry: &DecisionLogEntry);
}
