//! Messages the extension pages send to the engine.

use crate::engine::TabId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// The user answered the interstitial.
    BlockDecision {
        allowed: bool,
        #[serde(rename = "originalUrl", default)]
        original_url: Option<String>,
    },
    UpdateBadge,
    /// The interstitial is unloading. Not guaranteed to arrive.
    LeavingBlockPage,
}

/// A message together with the tab that sent it. Pages that are not tabs
/// (the settings page, for instance) omit `tabId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    #[serde(default)]
    pub tab_id: Option<TabId>,
    pub message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_page_messages() {
        let decision: Message = serde_json::from_str(
            r#"{"type":"BLOCK_DECISION","allowed":true,"originalUrl":"https://reddit.com/"}"#,
        )
        .unwrap();
        assert_eq!(
            decision,
            Message::BlockDecision {
                allowed: true,
                original_url: Some("https://reddit.com/".to_string())
            }
        );

        let leaving: Message = serde_json::from_str(r#"{"type":"LEAVING_BLOCK_PAGE"}"#).unwrap();
        assert_eq!(leaving, Message::LeavingBlockPage);

        let badge: Message = serde_json::from_str(r#"{"type":"UPDATE_BADGE"}"#).unwrap();
        assert_eq!(badge, Message::UpdateBadge);
    }

    #[test]
    fn test_decision_without_original_url() {
        let decision: Message =
            serde_json::from_str(r#"{"type":"BLOCK_DECISION","allowed":false,"originalUrl":null}"#)
                .unwrap();
        assert_eq!(
            decision,
            Message::BlockDecision {
                allowed: false,
                original_url: None
            }
        );
    }

    #[test]
    fn test_envelope_tab_is_optional() {
        let envelope: MessageEnvelope =
            serde_json::from_str(r#"{"message":{"type":"UPDATE_BADGE"}}"#).unwrap();
        assert_eq!(envelope.tab_id, None);

        let envelope: MessageEnvelope =
            serde_json::from_str(r#"{"tabId":7,"message":{"type":"LEAVING_BLOCK_PAGE"}}"#)
                .unwrap();
        assert_eq!(envelope.tab_id, Some(7));
    }
}
