use super::error::EngineError;
use super::session::TabId;
use super::traits::BrowserHost;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// A tab-control instruction for the extension shim to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand {
    UpdateTab {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        url: String,
    },
    SetBadge {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

/// [`BrowserHost`] that queues commands until the extension drains them.
///
/// When full, the oldest command is dropped.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    commands: Arc<RwLock<VecDeque<HostCommand>>>,
    capacity: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            commands: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, command: HostCommand) {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        if commands.len() >= self.capacity {
            if let Some(dropped) = commands.pop_front() {
                warn!("Command queue full, dropping {:?}", dropped);
            }
        }
        commands.push_back(command);
    }

    /// Takes every pending command, oldest first.
    pub fn drain(&self) -> Vec<HostCommand> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        commands.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl BrowserHost for CommandQueue {
    async fn update_tab(&self, tab_id: TabId, url: &str) -> Result<(), EngineError> {
        self.push(HostCommand::UpdateTab {
            tab_id,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn set_badge(&self, text: &str, color: Option<&str>) -> Result<(), EngineError> {
        self.push(HostCommand::SetBadge {
            text: text.to_string(),
            color: color.map(String::from),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_commands_in_order() {
        let queue = CommandQueue::new(8);
        queue.update_tab(1, "https://a.com").await.unwrap();
        queue.set_badge("2", Some("#FF6B6B")).await.unwrap();

        let commands = queue.drain();
        assert_eq!(
            commands,
            vec![
                HostCommand::UpdateTab {
                    tab_id: 1,
                    url: "https://a.com".to_string()
                },
                HostCommand::SetBadge {
                    text: "2".to_string(),
                    color: Some("#FF6B6B".to_string())
                },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let queue = CommandQueue::new(2);
        for tab_id in 1..=3 {
            queue.push(HostCommand::UpdateTab {
                tab_id,
                url: "https://x.com".to_string(),
            });
        }

        let tabs: Vec<TabId> = queue
            .drain()
            .into_iter()
            .filter_map(|c| match c {
                HostCommand::UpdateTab { tab_id, .. } => Some(tab_id),
                _ => None,
            })
            .collect();
        assert_eq!(tabs, vec![2, 3]);
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(HostCommand::UpdateTab {
            tab_id: 7,
            url: "https://x.com".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "updateTab");
        assert_eq!(json["tabId"], 7);
    }
}
